//! Email subjects and bodies

pub const VERIFICATION_SUBJECT: &str = "Email Verification - Todo App";
pub const WELCOME_SUBJECT: &str = "Welcome to Todo App!";

/// A rendered email: plain-text body with an HTML alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: &'static str,
    pub text_body: String,
    pub html_body: String,
}

pub fn verification_email(name: &str, code: &str, ttl_minutes: u64) -> EmailContent {
    let name = escape_html(name);

    EmailContent {
        subject: VERIFICATION_SUBJECT,
        text_body: format!(
            "Hello {name},\n\n\
             Your verification code is: {code}\n\n\
             The code expires in {ttl_minutes} minutes. \
             If you did not create an account, you can ignore this email.\n"
        ),
        html_body: format!(
            "<p>Hello {name},</p>\
             <p>Your verification code is:</p>\
             <h2 style=\"letter-spacing: 4px\">{code}</h2>\
             <p>The code expires in {ttl_minutes} minutes. \
             If you did not create an account, you can ignore this email.</p>"
        ),
    }
}

pub fn welcome_email(name: &str) -> EmailContent {
    let name = escape_html(name);

    EmailContent {
        subject: WELCOME_SUBJECT,
        text_body: format!(
            "Hello {name},\n\n\
             Your email address has been verified and your account is active.\n\
             Happy organizing!\n"
        ),
        html_body: format!(
            "<p>Hello {name},</p>\
             <p>Your email address has been verified and your account is active.</p>\
             <p>Happy organizing!</p>"
        ),
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_contains_code() {
        let email = verification_email("Alice", "042917", 10);

        assert_eq!(email.subject, VERIFICATION_SUBJECT);
        assert!(email.text_body.contains("042917"));
        assert!(email.text_body.contains("10 minutes"));
        assert!(email.html_body.contains("042917"));
        assert!(email.html_body.contains("Hello Alice"));
    }

    #[test]
    fn test_welcome_email() {
        let email = welcome_email("Bob");

        assert_eq!(email.subject, WELCOME_SUBJECT);
        assert!(email.text_body.starts_with("Hello Bob"));
    }

    #[test]
    fn test_name_is_escaped_in_html() {
        let email = welcome_email("<script>");

        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(!email.html_body.contains("<script>"));
    }
}
