use crate::feed::OrderEntry;

/// Sentinel order identifier that selects every entry in the feed.
pub const ALL_ORDERS: &str = "ALL";

/// Which entries of the feed to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSelector {
    All,
    Order(String),
}

impl OrderSelector {
    pub fn new(order: &str) -> Self {
        if order == ALL_ORDERS {
            Self::All
        } else {
            Self::Order(order.to_string())
        }
    }
}

/// An entry belongs to an order when its description mentions the order id.
/// Case-sensitive, unanchored.
pub fn matches(entry: &OrderEntry, order: &str) -> bool {
    entry.description.contains(order)
}

/// Links of the selected entries, in feed order.
pub fn select_links(entries: &[OrderEntry], selector: &OrderSelector) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| match selector {
            OrderSelector::All => true,
            OrderSelector::Order(order) => matches(entry, order),
        })
        .map(|entry| entry.link.clone())
        .collect()
}
