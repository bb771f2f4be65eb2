use crate::{error::Result, store::RemoteStore, types::Button};

/// Label given to buttons built from link files
pub const LINK_BUTTON_TEXT: &str = "link";

/// Fetch a file and decode it as UTF-8 text
///
/// Invalid sequences are replaced rather than rejected and a leading byte
/// order mark is dropped.
pub async fn load_text(store: &dyn RemoteStore, file_id: &str) -> Result<String> {
    let file = store.fetch_content(file_id).await?;
    let text = String::from_utf8_lossy(&file.content);
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Split text into trimmed, non-empty lines, keeping their order
///
/// Every Unicode line terminator ends a line: LF, CR, VT, FF, NEL and the
/// line and paragraph separators.
pub fn clean_lines(raw: &str) -> Vec<String> {
    raw.split(is_line_break)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Fetch a link file and turn its trimmed content into a button
pub async fn load_link(store: &dyn RemoteStore, file_id: &str) -> Result<Button> {
    let text = load_text(store, file_id).await?;
    Ok(Button {
        text: LINK_BUTTON_TEXT.to_string(),
        link: text.trim().to_string(),
    })
}
