use crate::core::models::{Delta, OutboundMessage};

pub const DEFAULT_DETAIL_CAP: usize = 5;
/// Discord's embed description limit.
pub const DEFAULT_BODY_BUDGET: usize = 4096;

const SEPARATOR: &str = ", ";
const TRUNCATION_MARKER: &str = ", ...";

/// Heading rendered above the overflow link list.
pub fn overflow_heading(remaining: usize) -> String {
    format!("+ {remaining} more streams:\n\n")
}

/// Joins `links` with `", "`, stopping before the first link that would push
/// the result plus the truncation marker past `budget`. A stop appends
/// `", ..."`; a result that holds no link at all is just `"..."`.
pub fn pack(links: &[String], budget: usize) -> String {
    let mut packed = String::new();
    let mut truncated = false;

    for (i, link) in links.iter().enumerate() {
        let separator = if i == 0 { "" } else { SEPARATOR };
        let next_len = separator.len() + link.len();
        if packed.len() + next_len + TRUNCATION_MARKER.len() > budget {
            truncated = true;
            break;
        }
        packed.push_str(separator);
        packed.push_str(link);
    }

    if truncated {
        if packed.is_empty() {
            packed.push_str(TRUNCATION_MARKER.trim_start_matches(SEPARATOR));
        } else {
            packed.push_str(TRUNCATION_MARKER);
        }
    }
    packed
}

#[derive(Debug, Clone)]
pub struct NotificationBatcher {
    detail_cap: usize,
    body_budget: usize,
}

impl NotificationBatcher {
    pub fn new(detail_cap: usize, body_budget: usize) -> Self {
        Self {
            detail_cap,
            body_budget,
        }
    }

    pub fn batch(&self, delta: &Delta) -> Vec<OutboundMessage> {
        if delta.first_cycle {
            return vec![OutboundMessage::Summary {
                count: delta.total_live,
                first_cycle: true,
            }];
        }

        let mut messages: Vec<OutboundMessage> = delta
            .items
            .iter()
            .take(self.detail_cap)
            .map(|stream| OutboundMessage::Detail(Box::new(stream.clone())))
            .collect();

        let remaining = &delta.items[messages.len()..];
        if !remaining.is_empty() {
            let links: Vec<String> = remaining.iter().map(|s| s.link()).collect();
            let budget = self
                .body_budget
                .saturating_sub(overflow_heading(remaining.len()).len());
            messages.push(OutboundMessage::Overflow {
                remaining_count: remaining.len(),
                links_blob: pack(&links, budget),
            });
        }

        messages
    }
}

impl Default for NotificationBatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DETAIL_CAP, DEFAULT_BODY_BUDGET)
    }
}
