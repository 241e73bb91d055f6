//! Native multi-asset holdings.
//!
//! A [`TokenBundle`] is always kept in canonical form: entries ordered by policy id and
//! then asset name (ascending byte value), with no duplicates and no zero quantities.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CardanoError, Result};

/// Signed token quantity. Negative values appear in mint bundles (burns) and in differences.
pub type Quantity = i128;

/// Maximum asset name length allowed by the ledger.
pub const MAX_ASSET_NAME_LENGTH: usize = 32;

/// Policy id: the 28-byte hash of the minting policy script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId(pub [u8; 28]);

impl PolicyId {
    pub fn from_hex(policy_id: &str) -> Result<Self> {
        let bytes = hex::decode(policy_id)
            .map_err(|e| CardanoError::SerializationError(format!("policy id: {}", e)))?;
        let array: [u8; 28] = bytes.try_into().map_err(|_| {
            CardanoError::SerializationError("policy id must be 28 bytes".to_string())
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; 28] {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Asset name, up to 32 arbitrary bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() > MAX_ASSET_NAME_LENGTH {
            return Err(CardanoError::SerializationError(format!(
                "asset name is {} bytes, max {}",
                bytes.len(),
                MAX_ASSET_NAME_LENGTH
            )));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(asset_name: &str) -> Result<Self> {
        let bytes = hex::decode(asset_name)
            .map_err(|e| CardanoError::SerializationError(format!("asset name: {}", e)))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Identifies one native asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
}

impl AssetId {
    pub fn new(policy_id: PolicyId, asset_name: AssetName) -> Self {
        Self {
            policy_id,
            asset_name,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.policy_id, hex::encode(self.asset_name.as_bytes()))
    }
}

/// Canonical multi-asset bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBundle(BTreeMap<AssetId, Quantity>);

impl TokenBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bundle from arbitrary entries, summing duplicates and dropping zeros.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (AssetId, Quantity)>,
    {
        let mut bundle = Self::new();
        for (asset, quantity) in entries {
            bundle.add(asset, quantity);
        }
        bundle
    }

    pub fn add(&mut self, asset: AssetId, quantity: Quantity) {
        if quantity == 0 {
            return;
        }
        let entry = self.0.entry(asset).or_insert(0);
        *entry += quantity;
        if *entry == 0 {
            self.0.retain(|_, q| *q != 0);
        }
    }

    pub fn get(&self, asset: &AssetId) -> Quantity {
        self.0.get(asset).copied().unwrap_or(0)
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.0.contains_key(asset)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct assets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, Quantity)> {
        self.0.iter().map(|(asset, quantity)| (asset, *quantity))
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.0.keys()
    }

    pub fn policy_count(&self) -> usize {
        self.by_policy().len()
    }

    /// Sum of the asset name lengths over all entries.
    pub fn asset_name_bytes(&self) -> usize {
        self.0.keys().map(|asset| asset.asset_name.len()).sum()
    }

    /// Entries grouped by policy, both levels in ascending byte order.
    pub fn by_policy(&self) -> BTreeMap<&PolicyId, Vec<(&AssetName, Quantity)>> {
        let mut grouped: BTreeMap<&PolicyId, Vec<(&AssetName, Quantity)>> = BTreeMap::new();
        for (asset, quantity) in &self.0 {
            grouped
                .entry(&asset.policy_id)
                .or_default()
                .push((&asset.asset_name, *quantity));
        }
        grouped
    }

    pub fn merge(&mut self, other: &TokenBundle) {
        for (asset, quantity) in other.iter() {
            self.add(asset.clone(), quantity);
        }
    }

    pub fn aggregate<'a, I>(bundles: I) -> Self
    where
        I: IntoIterator<Item = &'a TokenBundle>,
    {
        let mut total = Self::new();
        for bundle in bundles {
            total.merge(bundle);
        }
        total
    }

    /// `self - other`, entry by entry.
    pub fn difference(&self, other: &TokenBundle) -> Self {
        let mut result = self.clone();
        for (asset, quantity) in other.iter() {
            result.add(asset.clone(), -quantity);
        }
        result
    }

    pub fn first_negative(&self) -> Option<(&AssetId, Quantity)> {
        self.iter().find(|(_, quantity)| *quantity < 0)
    }

    pub fn has_negative(&self) -> bool {
        self.first_negative().is_some()
    }

    /// Fixed-size chunks of at most `max_assets` entries each, in canonical order.
    pub fn chunks(&self, max_assets: usize) -> Vec<TokenBundle> {
        let max_assets = max_assets.max(1);
        let entries: Vec<(AssetId, Quantity)> =
            self.0.iter().map(|(asset, quantity)| (asset.clone(), *quantity)).collect();
        entries
            .chunks(max_assets)
            .map(|chunk| TokenBundle(chunk.iter().cloned().collect()))
            .collect()
    }
}

impl FromIterator<(AssetId, Quantity)> for TokenBundle {
    fn from_iter<T: IntoIterator<Item = (AssetId, Quantity)>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(policy: u8, name: &str) -> AssetId {
        AssetId::new(PolicyId([policy; 28]), AssetName::new(name.as_bytes()).unwrap())
    }

    // ========================================================================
    // Canonical Form Tests
    // ========================================================================

    #[test]
    fn test_from_entries_sums_duplicates() {
        let bundle = TokenBundle::from_entries(vec![(asset(1, "a"), 5), (asset(1, "a"), 7)]);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.get(&asset(1, "a")), 12);
    }

    #[test]
    fn test_zero_entries_are_dropped() {
        let bundle = TokenBundle::from_entries(vec![
            (asset(1, "a"), 5),
            (asset(1, "a"), -5),
            (asset(2, "b"), 0),
        ]);
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_iteration_is_byte_ordered() {
        let bundle = TokenBundle::from_entries(vec![
            (asset(2, "a"), 1),
            (asset(1, "zz"), 1),
            (asset(1, "b"), 1),
            (asset(1, "ab"), 1),
        ]);
        let order: Vec<String> = bundle.assets().map(|a| a.to_string()).collect();
        assert_eq!(
            order,
            vec![
                asset(1, "ab").to_string(),
                asset(1, "b").to_string(),
                asset(1, "zz").to_string(),
                asset(2, "a").to_string(),
            ]
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = TokenBundle::from_entries(vec![(asset(1, "x"), 1), (asset(2, "y"), 2)]);
        let b = TokenBundle::from_entries(vec![(asset(2, "y"), 2), (asset(1, "x"), 1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_asset_name_too_long() {
        assert!(AssetName::new(vec![0u8; 33]).is_err());
        assert!(AssetName::new(vec![0u8; 32]).is_ok());
    }

    // ========================================================================
    // Arithmetic Tests
    // ========================================================================

    #[test]
    fn test_difference_and_negatives() {
        let inputs = TokenBundle::from_entries(vec![(asset(1, "a"), 8), (asset(1, "b"), 4)]);
        let outputs = TokenBundle::from_entries(vec![(asset(1, "a"), 2), (asset(1, "c"), 1)]);
        let diff = inputs.difference(&outputs);
        assert_eq!(diff.get(&asset(1, "a")), 6);
        assert_eq!(diff.get(&asset(1, "b")), 4);
        assert_eq!(diff.first_negative(), Some((&asset(1, "c"), -1)));
    }

    #[test]
    fn test_aggregate() {
        let one = TokenBundle::from_entries(vec![(asset(1, "a"), 1)]);
        let two = TokenBundle::from_entries(vec![(asset(1, "a"), 2), (asset(3, "c"), 3)]);
        let total = TokenBundle::aggregate([&one, &two]);
        assert_eq!(total.get(&asset(1, "a")), 3);
        assert_eq!(total.get(&asset(3, "c")), 3);
    }

    #[test]
    fn test_policy_count_and_name_bytes() {
        let bundle = TokenBundle::from_entries(vec![
            (asset(1, "abc"), 1),
            (asset(1, "de"), 1),
            (asset(2, ""), 1),
        ]);
        assert_eq!(bundle.policy_count(), 2);
        assert_eq!(bundle.asset_name_bytes(), 5);
    }

    #[test]
    fn test_chunks_fixed_size() {
        let bundle: TokenBundle = (0..7u8).map(|i| (asset(i, "t"), 1)).collect();
        let chunks = bundle.chunks(3);
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(TokenBundle::aggregate(chunks.iter()), bundle);
    }
}
