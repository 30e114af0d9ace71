/// Makes an email usable as a key inside a stored document.
///
/// Document paths reserve `.`, so every dot becomes a comma.
///
/// # Examples
///
/// ```
/// use coachme_core::storage::normalize_email_key;
///
/// assert_eq!(normalize_email_key("bob@x.com"), "bob@x,com");
/// ```
pub fn normalize_email_key(email: &str) -> String {
    email.replace('.', ",")
}
