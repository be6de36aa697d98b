// HTML pages rendered by the handlers
use actix_web::http::StatusCode;

const PAGE_STYLE: &str = r"
        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 0;
            min-height: 100vh;
            display: grid;
            place-items: center;
            background: #f9fafb;
        }
        main {
            text-align: center;
            padding: 32px;
            max-width: 640px;
        }
        h1 {
            color: #111827;
            font-size: 2.75rem;
            margin-bottom: 8px;
        }
        .subtitle {
            color: #6b7280;
            font-size: 1.1rem;
        }
        form {
            margin-top: 40px;
        }
        .row {
            display: flex;
            gap: 16px;
            align-items: center;
        }
        input {
            flex: auto;
            padding: 8px 14px;
            border-radius: 6px;
            border: 1px solid #d1d5db;
        }
        button {
            padding: 10px 14px;
            border: 0;
            border-radius: 6px;
            background: #4f46e5;
            color: white;
            font-weight: 600;
            cursor: pointer;
        }
        a {
            color: #111827;
            font-weight: 600;
            text-decoration: none;
        }
        .hint {
            margin-top: 16px;
            font-size: 0.9rem;
            color: #111827;
        }
        .error {
            color: #b91c1c;
        }";

/// Escape text for safe inclusion in HTML element content and attribute values
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Landing page greeting the signed-in identity or the anonymous visitor
#[must_use]
pub fn render_landing_page(identity: Option<&str>) -> String {
    let greeting = escape_html(identity.unwrap_or("logged-out user"));

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SAML Demo App</title>
    <style>{PAGE_STYLE}
    </style>
</head>
<body>
    <main>
        <h1>Hello, {greeting}!</h1>
        <p class="subtitle">This is a SAML demo app, signing in through an SSO broker.</p>

        <form method="get" action="/saml-redirect">
            <div class="row">
                <label for="email-address" hidden>Email address</label>
                <input id="email-address" name="email" value="john.doe@example.com" placeholder="john.doe@example.com">
                <button type="submit">Log in with SAML</button>
                <a href="/logout">Sign out</a>
            </div>
            <p class="hint">(Try any @example.com or @example.org email address.)</p>
        </form>
    </main>
</body>
</html>"#
    )
}

/// Error page for a failed handoff step
#[must_use]
pub fn render_error_page(status: StatusCode, reason: &str, message: &str) -> String {
    let title = escape_html(status.canonical_reason().unwrap_or("Error"));
    let reason = escape_html(reason);
    let message = escape_html(message);
    let code = status.as_u16();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{code} {title}</title>
    <style>{PAGE_STYLE}
    </style>
</head>
<body>
    <main>
        <h1>Sign-in failed</h1>
        <p class="subtitle error">{message}</p>
        <p class="hint">{code} {title} ({reason})</p>
        <p><a href="/">Back to the start page</a></p>
    </main>
</body>
</html>"#
    )
}
