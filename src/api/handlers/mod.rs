//! API request handlers

pub mod check;
pub mod endpoint;
pub mod health;

/// Raw query pairs, in request order
pub type QueryPairs = Vec<(String, String)>;

/// Value of a query parameter; a repeated key resolves to its last value
pub fn last_param(pairs: QueryPairs, key: &str) -> Option<String> {
    pairs
        .into_iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

#[cfg(test)]
pub(crate) mod test_support;
