use crate::MetaLog;
use filament_primitives::{Address, Block, Log, B256, U256};
use serde::{
    de,
    ser::{SerializeStruct, Serializer},
    Deserialize, Deserializer, Serialize,
};
use std::fmt;

/// Opaque identifier of one installed filter or block listener.
///
/// Callers must not assume any structure beyond string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for FilterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FilterId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Options for contract log filtering.
///
/// # Topic predicates
///
/// `topics` matches a prefix of a log's topic list, position by position:
///
/// - `[]` matches any topic list
/// - `[[A]]` matches topic `A` in the first position
/// - `[[], [B]]` matches any first topic AND `B` in the second position
///
/// A position holding more than one accepted value (a disjunction) is not
/// supported and is rejected by [`FilterQuery::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Restricts matches to a single block; mutually exclusive with the
    /// range fields.
    pub block_hash: Option<B256>,
    /// Beginning of the queried range; `None` means the genesis block.
    pub from_block: Option<U256>,
    /// End of the queried range; `None` means "keep tailing forever".
    pub to_block: Option<U256>,
    /// Restricts matches to logs of receipts created by these contracts; an
    /// empty list matches every address.
    pub addresses: Vec<Address>,
    /// Per-position accepted topic values; an empty entry is a wildcard.
    pub topics: Vec<Vec<B256>>,
}

impl FilterQuery {
    /// Checks the query invariants that cannot be expressed structurally.
    ///
    /// Rejects `block_hash` combined with a range field, and any topic
    /// position holding more than one accepted value.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.block_hash.is_some() && (self.from_block.is_some() || self.to_block.is_some()) {
            return Err(QueryError::BlockHashWithRange);
        }
        for (position, accepted) in self.topics.iter().enumerate() {
            if accepted.len() > 1 {
                return Err(QueryError::UnsupportedTopicDisjunction { position });
            }
        }
        Ok(())
    }

    /// Returns whether a log emitted by a receipt of `contract_address`
    /// satisfies this query's address and topic criteria.
    pub fn matches(&self, contract_address: Address, log: &Log) -> bool {
        if !self.addresses.is_empty() && !self.addresses.contains(&contract_address) {
            return false;
        }
        self.matches_topics(log)
    }

    /// Returns whether the log's topic list satisfies the position
    /// predicates.
    ///
    /// A log with fewer topics than there are predicate positions never
    /// matches. Positions past [`Self::validate`] hold at most one value; a
    /// disjunction that slipped through matches nothing.
    pub fn matches_topics(&self, log: &Log) -> bool {
        for (position, accepted) in self.topics.iter().enumerate() {
            let Some(topic) = log.topics.get(position) else {
                return false;
            };
            match accepted.as_slice() {
                [] => {}
                [value] => {
                    if topic != value {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueOrArray<T> {
    Value(T),
    Array(Vec<T>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicSpec {
    Single(Option<B256>),
    Many(Vec<Option<B256>>),
}

impl TopicSpec {
    /// Collapses a JSON topic position into its accepted-value set. `null`
    /// anywhere means the position is a wildcard.
    fn into_position(self) -> Vec<B256> {
        match self {
            Self::Single(None) => Vec::new(),
            Self::Single(Some(topic)) => vec![topic],
            Self::Many(topics) => {
                if topics.iter().any(Option::is_none) {
                    Vec::new()
                } else {
                    topics.into_iter().flatten().collect()
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for FilterQuery {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawQuery {
            block_hash: Option<B256>,
            from_block: Option<U256>,
            to_block: Option<U256>,
            address: Option<ValueOrArray<Address>>,
            topics: Option<Vec<TopicSpec>>,
        }

        let raw = RawQuery::deserialize(deserializer)?;

        if raw.block_hash.is_some() && (raw.from_block.is_some() || raw.to_block.is_some()) {
            return Err(de::Error::custom(QueryError::BlockHashWithRange));
        }

        let addresses = match raw.address {
            None => Vec::new(),
            Some(ValueOrArray::Value(address)) => vec![address],
            Some(ValueOrArray::Array(addresses)) => addresses,
        };
        let topics = raw
            .topics
            .map(|topics| topics.into_iter().map(TopicSpec::into_position).collect())
            .unwrap_or_default();

        Ok(Self {
            block_hash: raw.block_hash,
            from_block: raw.from_block,
            to_block: raw.to_block,
            addresses,
            topics,
        })
    }
}

impl Serialize for FilterQuery {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum TopicRepr<'a> {
            Wildcard,
            Single(&'a B256),
            Many(&'a [B256]),
        }

        let mut s = serializer.serialize_struct("FilterQuery", 5)?;
        if let Some(block_hash) = &self.block_hash {
            s.serialize_field("blockHash", block_hash)?;
        }
        if let Some(from_block) = &self.from_block {
            s.serialize_field("fromBlock", from_block)?;
        }
        if let Some(to_block) = &self.to_block {
            s.serialize_field("toBlock", to_block)?;
        }
        match self.addresses.as_slice() {
            [] => {}
            [address] => s.serialize_field("address", address)?,
            addresses => s.serialize_field("address", addresses)?,
        }
        if !self.topics.is_empty() {
            let topics = self
                .topics
                .iter()
                .map(|accepted| match accepted.as_slice() {
                    [] => TopicRepr::Wildcard,
                    [value] => TopicRepr::Single(value),
                    many => TopicRepr::Many(many),
                })
                .collect::<Vec<_>>();
            s.serialize_field("topics", &topics)?;
        }
        s.end()
    }
}

/// A query that can never be installed as a filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Both `blockHash` and a range field were set.
    #[error("cannot specify both blockHash and fromBlock/toBlock, choose one or the other")]
    BlockHashWithRange,
    /// A topic position accepts more than one value.
    #[error("topic disjunction at position {position} is not supported")]
    UnsupportedTopicDisjunction {
        /// The offending topic position.
        position: usize,
    },
}

/// The payload returned by one `eth_getFilterChanges` poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterChanges {
    /// Nothing accumulated since the last poll.
    #[default]
    Empty,
    /// Logs matched by a log filter.
    Logs(Vec<MetaLog>),
    /// Blocks observed by a block listener.
    Blocks(Vec<Block>),
}

impl FilterChanges {
    /// Returns the matched logs, if this is a log-filter response.
    pub fn into_logs(self) -> Option<Vec<MetaLog>> {
        match self {
            Self::Logs(logs) => Some(logs),
            Self::Empty => Some(Vec::new()),
            Self::Blocks(_) => None,
        }
    }

    /// Returns the observed blocks, if this is a block-listener response.
    pub fn into_blocks(self) -> Option<Vec<Block>> {
        match self {
            Self::Blocks(blocks) => Some(blocks),
            Self::Empty => Some(Vec::new()),
            Self::Logs(_) => None,
        }
    }
}

impl Serialize for FilterChanges {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Empty => serializer.collect_seq(std::iter::empty::<MetaLog>()),
            Self::Logs(logs) => logs.serialize(serializer),
            Self::Blocks(blocks) => blocks.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FilterChanges {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Changes {
            Logs(Vec<MetaLog>),
            Blocks(Vec<Block>),
        }

        Ok(match Changes::deserialize(deserializer)? {
            Changes::Logs(logs) if logs.is_empty() => Self::Empty,
            Changes::Logs(logs) => Self::Logs(logs),
            Changes::Blocks(blocks) if blocks.is_empty() => Self::Empty,
            Changes::Blocks(blocks) => Self::Blocks(blocks),
        })
    }
}
