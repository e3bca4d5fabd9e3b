use crate::sequence::operation::{EventType, Operation};

/// Display line for one step: action text plus a target annotation.
pub fn render_line(op: &Operation) -> String {
    let selector = if op.required_selectors.selector1 || op.selector2.is_empty() {
        &op.selector1
    } else {
        &op.selector2
    };

    let action = match op.event_type {
        EventType::Click => format!("click {}", selector),
        EventType::Fill => format!("fill {} \"{}\"", selector, op.params),
        EventType::Change => format!("change {} \"{}\"", selector, op.params),
        EventType::Sleep => format!("sleep {}ms", op.params),
        EventType::Screenshot => "screenshot".to_string(),
        EventType::Check => "check".to_string(),
        EventType::Closetab => "close tab".to_string(),
        EventType::Closewin => "close window".to_string(),
    };

    match op.event_type {
        EventType::Closewin => format!("{} [b{}]", action, op.browser_no),
        _ => format!("{} [b{}:t{}]", action, op.browser_no, op.tab_no),
    }
}
