//! Minimal inline pages. Templating is deliberately out of scope; these
//! exist so the login/register/predict/profile flows are exercisable end to
//! end from a browser.

use axum::response::Html;

use crate::classifier::Classification;
use crate::session::{Flash, SessionUser};
use crate::store::predictions::PredictionRecord;
use crate::store::users::User;

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn flash_block(flash: Option<&Flash>) -> String {
    flash.map_or_else(String::new, |flash| {
        format!(
            r#"<p class="flash {}">{}</p>"#,
            escape(&flash.category),
            escape(&flash.message)
        )
    })
}

fn nav(user: Option<&SessionUser>) -> String {
    match user {
        Some(user) => format!(
            r#"<nav><a href="/prediksi">Predict</a> <a href="/users">Account</a> <a href="/logout">Logout ({})</a></nav>"#,
            escape(&user.username)
        ),
        None => r#"<nav><a href="/login">Login</a> <a href="/register">Register</a></nav>"#
            .to_string(),
    }
}

fn layout(title: &str, user: Option<&SessionUser>, flash: Option<&Flash>, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}{}{}</body></html>",
        escape(title),
        nav(user),
        flash_block(flash),
        body
    ))
}

fn history_table(history: &[PredictionRecord]) -> String {
    if history.is_empty() {
        return "<p>No predictions yet.</p>".to_string();
    }
    let mut rows = String::new();
    for record in history {
        rows.push_str(&format!(
            "<tr><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>",
            record.sepal_length,
            record.sepal_width,
            record.petal_length,
            record.petal_width,
            escape(&record.label),
            escape(&record.created_at)
        ));
    }
    format!(
        "<table><thead><tr><th>Sepal length</th><th>Sepal width</th><th>Petal length</th><th>Petal width</th><th>Label</th><th>At</th></tr></thead><tbody>{rows}</tbody></table>"
    )
}

pub(super) fn login(flash: Option<&Flash>) -> Html<String> {
    layout(
        "Login",
        None,
        flash,
        r#"<h1>Login</h1>
<form method="post" action="/login">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Login</button>
</form>
<p><a href="/register">Create an account</a></p>"#,
    )
}

pub(super) fn register(flash: Option<&Flash>) -> Html<String> {
    layout(
        "Create account",
        None,
        flash,
        r#"<h1>Create account</h1>
<form method="post" action="/register">
<label>Username <input name="username" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Confirm password <input name="password_confirm" type="password" required></label>
<button type="submit">Register</button>
</form>
<p><a href="/login">Back to login</a></p>"#,
    )
}

pub(super) fn predict(
    user: &SessionUser,
    flash: Option<&Flash>,
    result: Option<&Classification>,
    values: [&str; 4],
    history: &[PredictionRecord],
) -> Html<String> {
    let result_block = result.map_or_else(String::new, |outcome| {
        format!(
            "<p>Prediction: <strong>{}</strong> (class {})</p>",
            escape(&outcome.label),
            outcome.class_id
        )
    });
    let body = format!(
        r#"<h1>Predict</h1>
<form method="post" action="/prediksi">
<label>Sepal length <input name="sepal_length" value="{}"></label>
<label>Sepal width <input name="sepal_width" value="{}"></label>
<label>Petal length <input name="petal_length" value="{}"></label>
<label>Petal width <input name="petal_width" value="{}"></label>
<button type="submit">Predict</button>
</form>
{}
<h2>History</h2>
{}"#,
        escape(values[0]),
        escape(values[1]),
        escape(values[2]),
        escape(values[3]),
        result_block,
        history_table(history)
    );
    layout("Predict", Some(user), flash, &body)
}

pub(super) fn profile(
    user: &SessionUser,
    account: &User,
    flash: Option<&Flash>,
    history: &[PredictionRecord],
) -> Html<String> {
    let body = format!(
        r#"<h1>Account</h1>
<dl>
<dt>Username</dt><dd>{}</dd>
<dt>Role</dt><dd>{}</dd>
<dt>Created</dt><dd>{}</dd>
<dt>Updated</dt><dd>{}</dd>
</dl>
<form method="post" action="/users/update-username">
<label>New username <input name="username" value="{}"></label>
<button type="submit">Change username</button>
</form>
<form method="post" action="/users/update-password">
<label>New password <input name="password" type="password"></label>
<button type="submit">Change password</button>
</form>
<h2>History</h2>
{}"#,
        escape(&account.username),
        account.role.as_str(),
        escape(&account.created_at),
        escape(&account.updated_at),
        escape(&account.username),
        history_table(history)
    );
    layout("Account", Some(user), flash, &body)
}
