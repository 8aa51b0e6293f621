//! Verification email body.

pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

/// Escape text for use inside HTML element content or a quoted attribute.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the HTML verification email.
pub fn verification_email_html(verify_url: &str, ttl_hours: i64) -> String {
    let url = escape_html(verify_url);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{VERIFICATION_SUBJECT}</title>
  <style>
    body {{ font-family: Arial, sans-serif; background: #f5f5f5; margin: 0; padding: 0; }}
    .container {{ max-width: 560px; margin: 40px auto; background: #ffffff; border-radius: 8px; }}
    .body {{ padding: 32px 24px; color: #333333; line-height: 1.6; }}
    .btn {{ display: inline-block; margin: 24px 0; padding: 14px 32px; background: #6d4c8e; color: #ffffff; text-decoration: none; border-radius: 6px; font-weight: bold; }}
    .link {{ word-break: break-all; font-size: 13px; color: #555555; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="body">
      <p>Thanks for signing up.</p>
      <p>Confirm your email address to activate your account. This link is valid for {ttl_hours} hours.</p>
      <a href="{url}" class="btn">Verify my email</a>
      <p>If the button does not work, paste this link into your browser:</p>
      <p class="link">{url}</p>
      <p>If you did not create an account, you can ignore this email.</p>
    </div>
  </div>
</body>
</html>"#
    )
}

/// Plain-text alternative.
pub fn verification_email_text(verify_url: &str, ttl_hours: i64) -> String {
    format!(
        "Thanks for signing up.\n\n\
         Confirm your email address by opening this link (valid for {ttl_hours} hours):\n\
         {verify_url}\n\n\
         If you did not create an account, you can ignore this email.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_contains_link_and_ttl() {
        let html = verification_email_html("https://example.org/verify?token=abc", 24);
        assert!(html.contains(r#"href="https://example.org/verify?token=abc""#));
        assert!(html.contains("valid for 24 hours"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_html_escapes_url() {
        let html = verification_email_html("https://example.org/v?a=1&b=\"2\"", 1);
        assert!(html.contains("a=1&amp;b=&quot;2&quot;"));
        assert!(!html.contains("b=\"2\""));
    }

    #[test]
    fn test_text_body() {
        let text = verification_email_text("https://example.org/v?token=t", 48);
        assert!(text.contains("https://example.org/v?token=t"));
        assert!(text.contains("48 hours"));
    }
}
