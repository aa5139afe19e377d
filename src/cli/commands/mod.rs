use clap::{
    Arg, ColorChoice, Command,
    builder::{
        ValueParser,
        styling::{AnsiColor, Effects, Styles},
    },
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("prediksi")
        .about("Iris classification with per-user prediction history")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PREDIKSI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("db")
                .short('d')
                .long("db")
                .help("Path to the SQLite database file")
                .default_value("app.db")
                .env("PREDIKSI_DB"),
        )
        .arg(
            Arg::new("session-secret")
                .long("session-secret")
                .help("Secret used to sign session cookies; rotating it invalidates all sessions")
                .default_value("dev-secret-change-me")
                .env("PREDIKSI_SESSION_SECRET"),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .help("Bootstrap password for the admin account")
                .default_value("admin")
                .env("PREDIKSI_ADMIN_PASSWORD"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("PREDIKSI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
