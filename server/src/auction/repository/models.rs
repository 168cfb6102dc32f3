#[cfg(test)]
use mockall::automock;
use {
    super::entities,
    crate::{
        api::RestError,
        kernel::{
            db::DB,
            entities::UserId,
        },
    },
    axum::async_trait,
    sqlx::FromRow,
    std::fmt::Debug,
    time::{
        OffsetDateTime,
        PrimitiveDateTime,
        UtcOffset,
    },
    tracing::instrument,
    uuid::Uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "auction_status", rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Scheduled,
    Active,
    Ended,
    Cancelled,
}

impl From<AuctionStatus> for entities::AuctionStatus {
    fn from(status: AuctionStatus) -> Self {
        match status {
            AuctionStatus::Draft => Self::Draft,
            AuctionStatus::Scheduled => Self::Scheduled,
            AuctionStatus::Active => Self::Active,
            AuctionStatus::Ended => Self::Ended,
            AuctionStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<entities::AuctionStatus> for AuctionStatus {
    fn from(status: entities::AuctionStatus) -> Self {
        match status {
            entities::AuctionStatus::Draft => Self::Draft,
            entities::AuctionStatus::Scheduled => Self::Scheduled,
            entities::AuctionStatus::Active => Self::Active,
            entities::AuctionStatus::Ended => Self::Ended,
            entities::AuctionStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "seller_decision", rename_all = "snake_case")]
pub enum SellerDecision {
    Pending,
    Accepted,
    Rejected,
    CounterOffered,
}

impl From<SellerDecision> for entities::SellerDecision {
    fn from(decision: SellerDecision) -> Self {
        match decision {
            SellerDecision::Pending => Self::Pending,
            SellerDecision::Accepted => Self::Accepted,
            SellerDecision::Rejected => Self::Rejected,
            SellerDecision::CounterOffered => Self::CounterOffered,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, sqlx::Type)]
#[sqlx(type_name = "counter_offer_status", rename_all = "snake_case")]
pub enum CounterOfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl From<CounterOfferStatus> for entities::CounterOfferStatus {
    fn from(status: CounterOfferStatus) -> Self {
        match status {
            CounterOfferStatus::Pending => Self::Pending,
            CounterOfferStatus::Accepted => Self::Accepted,
            CounterOfferStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Clone, FromRow, Debug)]
pub struct Auction {
    pub id:                      entities::AuctionId,
    pub title:                   String,
    pub description:             String,
    pub category:                Option<String>,
    pub starting_price:          f64,
    pub bid_increment:           f64,
    pub current_highest_bid:     Option<f64>,
    pub start_time:              PrimitiveDateTime,
    pub end_time:                PrimitiveDateTime,
    pub status:                  AuctionStatus,
    pub seller_id:               UserId,
    pub winner_id:               Option<UserId>,
    pub winning_bid:             Option<f64>,
    pub seller_decision:         Option<SellerDecision>,
    pub counter_offer_amount:    Option<f64>,
    pub counter_offer_status:    Option<CounterOfferStatus>,
    pub is_transaction_complete: bool,
    pub creation_time:           PrimitiveDateTime,
}

impl Auction {
    pub fn get_auction_entity(&self) -> entities::Auction {
        entities::Auction {
            id:                  self.id,
            title:               self.title.clone(),
            description:         self.description.clone(),
            category:            self.category.clone(),
            starting_price:      self.starting_price,
            bid_increment:       self.bid_increment,
            current_highest_bid: self.current_highest_bid,
            start_time:          self.start_time.assume_offset(UtcOffset::UTC),
            end_time:            self.end_time.assume_offset(UtcOffset::UTC),
            status:              self.status.into(),
            seller_id:           self.seller_id,
            winner_id:           self.winner_id,
            winning_bid:         self.winning_bid,
            negotiation:         entities::Negotiation {
                seller_decision:         self.seller_decision.map(Into::into),
                counter_offer_amount:    self.counter_offer_amount,
                counter_offer_status:    self.counter_offer_status.map(Into::into),
                is_transaction_complete: self.is_transaction_complete,
            },
            creation_time:       self.creation_time.assume_offset(UtcOffset::UTC),
        }
    }
}

/// A bid row joined with the public columns of its bidder. All reads go
/// through this shape so events and history carry the bidder display data.
#[derive(Clone, FromRow, Debug)]
pub struct Bid {
    pub id:                entities::BidId,
    pub auction_id:        entities::AuctionId,
    pub bidder_id:         UserId,
    pub amount:            f64,
    pub is_winning:        bool,
    pub bid_time:          PrimitiveDateTime,
    pub bidder_username:   String,
    pub bidder_first_name: String,
    pub bidder_last_name:  String,
}

const BID_COLUMNS: &str = "b.id, b.auction_id, b.bidder_id, b.amount, b.is_winning, b.bid_time, \
     u.username AS bidder_username, u.first_name AS bidder_first_name, u.last_name AS bidder_last_name";

impl Bid {
    pub fn get_bid_entity(&self) -> entities::Bid {
        entities::Bid {
            id:         self.id,
            auction_id: self.auction_id,
            amount:     self.amount,
            bid_time:   self.bid_time.assume_offset(UtcOffset::UTC),
            is_winning: self.is_winning,
            bidder:     entities::Bidder {
                id:         self.bidder_id,
                username:   self.bidder_username.clone(),
                first_name: self.bidder_first_name.clone(),
                last_name:  self.bidder_last_name.clone(),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct CommitBidInput {
    pub auction_id: entities::AuctionId,
    pub bidder:     entities::Bidder,
    pub amount:     f64,
    pub now:        OffsetDateTime,
}

/// The previous leading bid displaced by a commit; drives the outbid
/// notification.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviousLeader {
    pub bidder_id: UserId,
    pub amount:    f64,
}

#[derive(Clone, Debug)]
pub struct CommittedBid {
    pub bid:             entities::Bid,
    pub previous_leader: Option<PreviousLeader>,
}

fn to_primitive(time: OffsetDateTime) -> PrimitiveDateTime {
    let utc = time.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Database: Debug + Send + Sync + 'static {
    async fn add_auction(&self, auction: &entities::Auction) -> anyhow::Result<()>;
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<entities::Auction, RestError>;
    /// The single serialization point of the bid path: locks the auction
    /// row, re-validates deadline and minimum against the committed state,
    /// inserts the ledger row, flips the winner and refreshes the
    /// denormalized leader snapshot, all in one transaction.
    async fn commit_bid(&self, input: CommitBidInput) -> Result<CommittedBid, RestError>;
    async fn get_winning_bid(
        &self,
        auction_id: entities::AuctionId,
    ) -> anyhow::Result<Option<entities::Bid>>;
    async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Bid>, u64), RestError>;
    async fn get_auctions_to_start(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::Auction>>;
    async fn get_auctions_to_end(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::Auction>>;
    /// Guarded transition; false means another sweep already applied it.
    async fn start_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool>;
    /// Guarded transition; false means another sweep already applied it.
    async fn end_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool>;
}

#[async_trait]
impl Database for DB {
    #[instrument(name = "db_add_auction", skip_all, fields(auction_id))]
    async fn add_auction(&self, auction: &entities::Auction) -> anyhow::Result<()> {
        tracing::Span::current().record("auction_id", auction.id.to_string());
        sqlx::query(
            "INSERT INTO auction (id, title, description, category, starting_price, bid_increment, \
             start_time, end_time, status, seller_id, is_transaction_complete, creation_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11)",
        )
        .bind(auction.id)
        .bind(&auction.title)
        .bind(&auction.description)
        .bind(&auction.category)
        .bind(auction.starting_price)
        .bind(auction.bid_increment)
        .bind(to_primitive(auction.start_time))
        .bind(to_primitive(auction.end_time))
        .bind(AuctionStatus::from(auction.status))
        .bind(auction.seller_id)
        .bind(to_primitive(auction.creation_time))
        .execute(self)
        .await?;
        Ok(())
    }

    #[instrument(name = "db_get_auction", skip_all, fields(auction_id))]
    async fn get_auction(
        &self,
        auction_id: entities::AuctionId,
    ) -> Result<entities::Auction, RestError> {
        tracing::Span::current().record("auction_id", auction_id.to_string());
        let auction: Auction = sqlx::query_as("SELECT * FROM auction WHERE id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::AuctionNotFound,
                _ => {
                    tracing::error!(
                        error = e.to_string(),
                        auction_id = auction_id.to_string(),
                        "Failed to get auction from db"
                    );
                    RestError::TemporarilyUnavailable
                }
            })?;
        Ok(auction.get_auction_entity())
    }

    #[instrument(name = "db_commit_bid", skip_all, fields(auction_id, bid_id))]
    async fn commit_bid(&self, input: CommitBidInput) -> Result<CommittedBid, RestError> {
        tracing::Span::current().record("auction_id", input.auction_id.to_string());
        let mut tx = self.begin().await.map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to begin bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        let auction: Auction = sqlx::query_as("SELECT * FROM auction WHERE id = $1 FOR UPDATE")
            .bind(input.auction_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RestError::AuctionNotFound,
                _ => {
                    tracing::error!(error = e.to_string(), "Failed to lock auction row");
                    RestError::TemporarilyUnavailable
                }
            })?;
        let auction = auction.get_auction_entity();

        // Validation against the row state under the lock decides the race:
        // whoever gets here second sees the first commit and is measured
        // against the updated minimum.
        if !auction.is_open_for_bids(input.now) {
            return Err(RestError::AuctionNotActive);
        }
        let minimum = auction.minimum_next_bid(auction.current_highest_bid);
        if input.amount < minimum {
            return Err(RestError::BidTooLow { minimum });
        }

        let previous: Option<Bid> = sqlx::query_as(&format!(
            "SELECT {BID_COLUMNS} FROM bid b JOIN users u ON u.id = b.bidder_id \
             WHERE b.auction_id = $1 AND b.is_winning"
        ))
        .bind(input.auction_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to read previous winning bid");
            RestError::TemporarilyUnavailable
        })?;

        let bid_id: entities::BidId = Uuid::new_v4();
        tracing::Span::current().record("bid_id", bid_id.to_string());
        let bid_time = to_primitive(input.now);
        let result: Result<(), sqlx::Error> = async {
            sqlx::query(
                "INSERT INTO bid (id, auction_id, bidder_id, amount, is_winning, bid_time) \
                 VALUES ($1, $2, $3, $4, FALSE, $5)",
            )
            .bind(bid_id)
            .bind(input.auction_id)
            .bind(input.bidder.id)
            .bind(input.amount)
            .bind(bid_time)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE bid SET is_winning = FALSE WHERE auction_id = $1 AND is_winning")
                .bind(input.auction_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE bid SET is_winning = TRUE WHERE id = $1")
                .bind(bid_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "UPDATE auction SET current_highest_bid = $1, winner_id = $2, winning_bid = $1 \
                 WHERE id = $3",
            )
            .bind(input.amount)
            .bind(input.bidder.id)
            .bind(input.auction_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await
        }
        .await;
        result.map_err(|e| {
            tracing::error!(error = e.to_string(), "Failed to commit bid transaction");
            RestError::TemporarilyUnavailable
        })?;

        Ok(CommittedBid {
            bid:             entities::Bid {
                id:         bid_id,
                auction_id: input.auction_id,
                amount:     input.amount,
                bid_time:   input.now,
                is_winning: true,
                bidder:     input.bidder,
            },
            previous_leader: previous.map(|previous| PreviousLeader {
                bidder_id: previous.bidder_id,
                amount:    previous.amount,
            }),
        })
    }

    #[instrument(name = "db_get_winning_bid", skip_all)]
    async fn get_winning_bid(
        &self,
        auction_id: entities::AuctionId,
    ) -> anyhow::Result<Option<entities::Bid>> {
        let bid: Option<Bid> = sqlx::query_as(&format!(
            "SELECT {BID_COLUMNS} FROM bid b JOIN users u ON u.id = b.bidder_id \
             WHERE b.auction_id = $1 AND b.is_winning"
        ))
        .bind(auction_id)
        .fetch_optional(self)
        .await?;
        Ok(bid.map(|bid| bid.get_bid_entity()))
    }

    #[instrument(name = "db_get_bids", skip_all)]
    async fn get_bids(
        &self,
        auction_id: entities::AuctionId,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<entities::Bid>, u64), RestError> {
        let error = |e: sqlx::Error| {
            tracing::error!(
                error = e.to_string(),
                auction_id = auction_id.to_string(),
                "Failed to get bids from db"
            );
            RestError::TemporarilyUnavailable
        };
        let bids: Vec<Bid> = sqlx::query_as(&format!(
            "SELECT {BID_COLUMNS} FROM bid b JOIN users u ON u.id = b.bidder_id \
             WHERE b.auction_id = $1 ORDER BY b.amount DESC, b.bid_time ASC LIMIT $2 OFFSET $3"
        ))
        .bind(auction_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self)
        .await
        .map_err(error)?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bid WHERE auction_id = $1")
            .bind(auction_id)
            .fetch_one(self)
            .await
            .map_err(error)?;
        Ok((
            bids.iter().map(|bid| bid.get_bid_entity()).collect(),
            total as u64,
        ))
    }

    #[instrument(name = "db_get_auctions_to_start", skip_all)]
    async fn get_auctions_to_start(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::Auction>> {
        let auctions: Vec<Auction> =
            sqlx::query_as("SELECT * FROM auction WHERE status = 'scheduled' AND start_time <= $1")
                .bind(to_primitive(now))
                .fetch_all(self)
                .await?;
        Ok(auctions
            .iter()
            .map(|auction| auction.get_auction_entity())
            .collect())
    }

    #[instrument(name = "db_get_auctions_to_end", skip_all)]
    async fn get_auctions_to_end(
        &self,
        now: OffsetDateTime,
    ) -> anyhow::Result<Vec<entities::Auction>> {
        let auctions: Vec<Auction> =
            sqlx::query_as("SELECT * FROM auction WHERE status = 'active' AND end_time <= $1")
                .bind(to_primitive(now))
                .fetch_all(self)
                .await?;
        Ok(auctions
            .iter()
            .map(|auction| auction.get_auction_entity())
            .collect())
    }

    #[instrument(name = "db_start_auction", skip_all, fields(auction_id))]
    async fn start_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool> {
        tracing::Span::current().record("auction_id", auction_id.to_string());
        let updated =
            sqlx::query("UPDATE auction SET status = 'active' WHERE id = $1 AND status = 'scheduled'")
                .bind(auction_id)
                .execute(self)
                .await?
                .rows_affected();
        Ok(updated > 0)
    }

    #[instrument(name = "db_end_auction", skip_all, fields(auction_id))]
    async fn end_auction(&self, auction_id: entities::AuctionId) -> anyhow::Result<bool> {
        tracing::Span::current().record("auction_id", auction_id.to_string());
        let updated =
            sqlx::query("UPDATE auction SET status = 'ended' WHERE id = $1 AND status = 'active'")
                .bind(auction_id)
                .execute(self)
                .await?
                .rows_affected();
        Ok(updated > 0)
    }
}
