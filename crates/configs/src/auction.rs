use {
    anyhow::ensure,
    serde::{Deserialize, Serialize},
    std::time::Duration,
};

fn default_max_auction_duration() -> Duration {
    Duration::from_secs(172800) // 2d
}

fn default_bid_duration() -> Duration {
    Duration::from_secs(10800) // 3h
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Params {
    /// Time from the start of an auction until it ends at the latest,
    /// regardless of how many bids arrive.
    #[serde(with = "humantime_serde", default = "default_max_auction_duration")]
    pub max_auction_duration: Duration,

    /// How far every accepted bid pushes out the end of the auction.
    #[serde(with = "humantime_serde", default = "default_bid_duration")]
    pub bid_duration: Duration,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_auction_duration: default_max_auction_duration(),
            bid_duration: default_bid_duration(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.max_auction_duration.is_zero(),
            "max-auction-duration must be positive"
        );
        ensure!(!self.bid_duration.is_zero(), "bid-duration must be positive");
        ensure!(
            self.bid_duration <= self.max_auction_duration,
            "bid-duration ({:?}) exceeds max-auction-duration ({:?})",
            self.bid_duration,
            self.max_auction_duration
        );
        Ok(())
    }
}
