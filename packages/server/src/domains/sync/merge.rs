use std::collections::HashSet;

use reso_client::ResoProperty;

use crate::domains::listings::Listing;

/// Agent listings first, then brokerage listings the agent set doesn't cover.
///
/// Returns the combined list and the agent listing keys.
pub fn merge_agent_first(
    agent: Vec<ResoProperty>,
    brokerage: Vec<ResoProperty>,
) -> (Vec<ResoProperty>, HashSet<String>) {
    let agent_keys: HashSet<String> = agent.iter().map(|l| l.listing_key.clone()).collect();

    let mut combined = agent;
    combined.extend(
        brokerage
            .into_iter()
            .filter(|l| !agent_keys.contains(&l.listing_key)),
    );

    (combined, agent_keys)
}

/// Keep the first listing for each `listing_key`, preserving order.
pub fn dedup_by_key(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|l| seen.insert(l.listing_key.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::listings::transform::{transform, TransformContext};

    fn property(key: &str, office: &str) -> ResoProperty {
        ResoProperty {
            listing_key: key.to_string(),
            list_office_name: Some(office.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn agent_listings_take_precedence() {
        let agent = vec![property("A", "Agent Office"), property("B", "Agent Office")];
        let brokerage = vec![
            property("B", "Partnership"),
            property("C", "Partnership"),
        ];

        let (combined, agent_keys) = merge_agent_first(agent, brokerage);

        let keys: Vec<&str> = combined.iter().map(|l| l.listing_key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(combined[1].list_office_name.as_deref(), Some("Agent Office"));
        assert!(agent_keys.contains("B"));
        assert!(!agent_keys.contains("C"));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let ctx = TransformContext::now();
        let first = transform(&property("X", "first"), vec![], ctx);
        let second = transform(&property("X", "second"), vec![], ctx);
        let other = transform(&property("Y", "other"), vec![], ctx);

        let unique = dedup_by_key(vec![first, other, second]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].office_name.as_deref(), Some("first"));
        assert_eq!(unique[1].listing_key, "Y");
    }
}
