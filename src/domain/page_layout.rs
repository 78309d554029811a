/// CSS selectors for the dataset download page.
pub const LOCALE_SELECT: &str = ".input-row select";
pub const BUNDLE_LOCALE: &str = r#".wrapper > [name="bundleLocale"]"#;
pub const FIRST_ROW_MARKER: &str = "tr:nth-child(1) > .highlight:nth-child(1)";
pub const PANEL_ROOT: &str = ".dataset-download-prompt:nth-child(3)";
/// Matched across the whole document, not under `PANEL_ROOT`. Only the gated
/// panel renders one, and `DOWNLOAD_LABEL` filters out any other button.
pub const DOWNLOAD_LINK: &str = "a.button.rounded.download-language";
pub const DOWNLOAD_LABEL: &str = "Download Dataset Bundle";

pub fn row_target(index: usize) -> String {
    format!("tr:nth-child({}) > .highlight:nth-child(1)", index)
}

pub fn confirm_size() -> String {
    format!(r#"{} [name="confirmSize"]"#, PANEL_ROOT)
}

pub fn secondary_confirmation() -> String {
    format!(
        "{} .labeled-checkbox:nth-child(3) > .checkbox-container input",
        PANEL_ROOT
    )
}

pub fn email_field() -> String {
    format!(r#"{} [name="email"] > [name="email"]"#, PANEL_ROOT)
}

pub fn enabled_email_field() -> String {
    format!("{}:not([disabled])", email_field())
}

pub fn mailing_list_opt_in() -> String {
    format!(r#"{} [name="confirmJoinMailingList"]"#, PANEL_ROOT)
}
