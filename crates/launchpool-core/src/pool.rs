//! The launch pool: purchase processor, admin surface, and reconciliation.
//!
//! [`LaunchPool`] owns every piece of mutable sale state: investor records,
//! running totals, the whitelist, the allowance ledger, and the inventory
//! book. It is the only writer of investor records and the only initiator
//! of purchase transfers.
//!
//! # Purchase Pipeline
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌────────────────┐   ┌────────────┐
//! │ EpochClock │──▶│ Whitelist │──▶│ Pricing +      │──▶│ Pool supply│
//! │ Active(n)? │   │ member?   │   │ Allowance      │   │ balance,   │
//! └────────────┘   └───────────┘   └────────────────┘   │ approval   │
//!                                                        └─────┬──────┘
//!        ┌─────────────────────────────────────────────────────┘
//!        ▼
//! ┌──────────────────────┐   ┌────────────────────────────┐
//! │ EFFECTS              │──▶│ INTERACTIONS               │
//! │ allowance, record,   │   │ investor → pool  (cost)    │
//! │ totals, inventory    │   │ pool → investor  (tokens)  │
//! └──────────────────────┘   └────────────────────────────┘
//! ```
//!
//! All checks run before the first effect. Internal state is fully updated
//! before the first external transfer. If a transfer still fails, the
//! effects are rewound and any completed transfer reversed.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use launchpool_ingress::{AllowanceLedger, Clock, EpochClock, PricingEngine, WhitelistRegistry};
use launchpool_settlement::{
    AssetLedger, InventoryBook, InventoryEntry, SweepContext, TreasurySettlement,
};
use launchpool_types::{
    Address, Allocation, Amount, EpochIndex, InvestorRecord, LaunchpoolError, PoolTotals,
    PresaleConfig, PurchaseReceipt, ReceiptId, Result, SalePhase, SettlementReceipt, constants,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// The pool's current balances, read from the asset ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolHoldings {
    pub standard_token: Amount,
    pub degen_token: Amount,
    pub investment_token: Amount,
}

/// State captured before a purchase's effects, for rewinding.
struct Checkpoint {
    investor: Address,
    record: Option<InvestorRecord>,
    totals: PoolTotals,
    inventory: InventoryBook,
    cost: Amount,
}

/// A time-gated two-class presale over an [`AssetLedger`].
pub struct LaunchPool<L, C> {
    config: PresaleConfig,
    epochs: EpochClock,
    whitelist: WhitelistRegistry,
    pricing: PricingEngine,
    allowance: AllowanceLedger,
    settlement: TreasurySettlement,
    records: HashMap<Address, InvestorRecord>,
    totals: PoolTotals,
    inventory: InventoryBook,
    ledger: L,
    clock: C,
}

impl<L: AssetLedger, C: Clock> LaunchPool<L, C> {
    /// Validate `config` and open a pool over `ledger`.
    ///
    /// # Errors
    /// - `Configuration` if the config is invalid
    /// - `UnknownAsset` if the ledger does not know one of the three assets
    pub fn new(config: PresaleConfig, ledger: L, clock: C) -> Result<Self> {
        config.validate()?;
        for asset in [
            config.standard_token,
            config.degen_token,
            config.investment_token,
        ] {
            ledger.decimals(&asset)?;
        }

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            pool = %config.pool,
            admin = %config.admin,
            start_time = config.start_time,
            epoch_duration = config.epoch_duration,
            total_epochs = config.total_epochs,
            p_price = config.p_price,
            d_price = config.d_price,
            "Launch pool opened"
        );

        Ok(Self {
            epochs: EpochClock::from_config(&config),
            whitelist: WhitelistRegistry::new(config.admin),
            pricing: PricingEngine::from_config(&config),
            allowance: AllowanceLedger::from_config(&config),
            settlement: TreasurySettlement::from_config(&config),
            records: HashMap::new(),
            totals: PoolTotals::default(),
            inventory: InventoryBook::new(),
            config,
            ledger,
            clock,
        })
    }

    // -----------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------

    /// Phase at the current instant; never cached.
    pub fn phase(&self) -> SalePhase {
        let now = self.clock.now();
        let phase = self.epochs.phase(now);
        tracing::debug!(now, %phase, "Phase lookup");
        phase
    }

    /// Current epoch index, clamped to `total_epochs` once ended.
    pub fn current_epoch(&self) -> EpochIndex {
        self.epochs.current_epoch(self.clock.now())
    }

    pub fn epoch_clock(&self) -> &EpochClock {
        &self.epochs
    }

    // -----------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------

    pub fn admin(&self) -> Address {
        self.whitelist.admin()
    }

    /// Hand whitelist and settlement authority to `new_admin`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the admin
    /// - `Configuration` if `new_admin` is zero or one of the pool's own
    ///   accounts, which could never act as admin
    pub fn transfer_admin(&mut self, caller: Address, new_admin: Address) -> Result<()> {
        if caller != self.whitelist.admin() {
            return Err(LaunchpoolError::Unauthorized(caller));
        }
        if new_admin.is_zero() || self.is_reserved(&new_admin) {
            return Err(LaunchpoolError::Configuration(format!(
                "admin cannot be {new_admin}"
            )));
        }
        self.whitelist.set_admin(caller, new_admin)?;
        self.settlement.set_operator(caller, new_admin)?;
        tracing::info!(from = %caller, to = %new_admin, "Admin role transferred");
        Ok(())
    }

    pub fn enable_whitelist(&mut self, caller: Address, enabled: bool) -> Result<()> {
        self.whitelist.set_enabled(caller, enabled)
    }

    pub fn add_whitelist(&mut self, caller: Address, who: Address) -> Result<bool> {
        self.whitelist.add(caller, who)
    }

    pub fn remove_whitelist(&mut self, caller: Address, who: Address) -> Result<bool> {
        self.whitelist.remove(caller, who)
    }

    pub fn add_multiple_whitelist<I>(&mut self, caller: Address, batch: I) -> Result<usize>
    where
        I: IntoIterator<Item = Address>,
    {
        self.whitelist.add_many(caller, batch)
    }

    pub fn is_whitelisted(&self, who: &Address) -> bool {
        self.whitelist.is_whitelisted(who)
    }

    pub fn whitelist_enabled(&self) -> bool {
        self.whitelist.is_enabled()
    }

    pub fn whitelist_len(&self) -> usize {
        self.whitelist.len()
    }

    // -----------------------------------------------------------------
    // Investor queries
    // -----------------------------------------------------------------

    /// How much more investment currency `investor` may commit right now.
    pub fn investor_current_buy_allowance(&self, investor: &Address) -> Amount {
        self.allowance
            .remaining_allowance(investor, self.current_epoch())
    }

    /// `(standard_bought, degen_bought, amount_invested)`; zeros for an
    /// address that never bought.
    pub fn check_investor_details(&self, investor: &Address) -> (Amount, Amount, Amount) {
        self.investor_record(investor)
            .copied()
            .unwrap_or_default()
            .as_tuple()
    }

    pub fn investor_record(&self, investor: &Address) -> Option<&InvestorRecord> {
        self.records.get(investor)
    }

    pub fn investor_count(&self) -> usize {
        self.records.len()
    }

    pub fn totals(&self) -> PoolTotals {
        self.totals
    }

    pub fn config(&self) -> &PresaleConfig {
        &self.config
    }

    /// Read the pool's live balances of all three assets.
    pub fn holdings(&self) -> Result<PoolHoldings> {
        let pool = &self.config.pool;
        Ok(PoolHoldings {
            standard_token: self.ledger.balance_of(&self.config.standard_token, pool)?,
            degen_token: self.ledger.balance_of(&self.config.degen_token, pool)?,
            investment_token: self.ledger.balance_of(&self.config.investment_token, pool)?,
        })
    }

    /// Per-asset flows recorded by the pool.
    pub fn inventory(&self) -> BTreeMap<Address, InventoryEntry> {
        self.inventory.snapshot()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Accounts the pool itself controls or trades: the pool, the treasury,
    /// and the three assets.
    pub fn is_reserved(&self, who: &Address) -> bool {
        [
            self.config.pool,
            self.config.treasury,
            self.config.standard_token,
            self.config.degen_token,
            self.config.investment_token,
        ]
        .contains(who)
    }

    /// Direct ledger access for provisioning outside the pool's own flows
    /// (minting inventory, investor approvals).
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -----------------------------------------------------------------
    // Purchases
    // -----------------------------------------------------------------

    /// Buy `amount` standard presale tokens for `caller`.
    pub fn buy_standard(&mut self, caller: Address, amount: Amount) -> Result<PurchaseReceipt> {
        self.buy(caller, Allocation::Standard, amount)
    }

    /// Buy `amount` degen presale tokens for `caller`.
    pub fn buy_degen(&mut self, caller: Address, amount: Amount) -> Result<PurchaseReceipt> {
        self.buy(caller, Allocation::Degen, amount)
    }

    /// Buy `amount` presale-token base units of `allocation`.
    ///
    /// Either every effect applies or none does.
    ///
    /// # Errors
    /// In check order: `NotActive`, `NotWhitelisted`, `Unauthorized` (a
    /// reserved account as buyer), `InvalidAmount`,
    /// `ArithmeticOverflow` / `AllowanceExceeded`, `InsufficientPoolSupply`,
    /// `InsufficientBalance`, `InsufficientApproval`. Transfer failures from
    /// the ledger are returned after rewinding.
    pub fn buy(
        &mut self,
        caller: Address,
        allocation: Allocation,
        amount: Amount,
    ) -> Result<PurchaseReceipt> {
        let result = self.execute_purchase(caller, allocation, amount);
        match &result {
            Ok(receipt) => tracing::info!(
                receipt = %receipt.id,
                investor = %caller,
                %allocation,
                tokens = receipt.tokens,
                cost = receipt.cost,
                epoch = receipt.epoch,
                "Purchase executed"
            ),
            Err(err) => tracing::warn!(
                investor = %caller,
                %allocation,
                amount,
                code = err.code(),
                error = %err,
                "Purchase rejected"
            ),
        }
        result
    }

    fn execute_purchase(
        &mut self,
        caller: Address,
        allocation: Allocation,
        amount: Amount,
    ) -> Result<PurchaseReceipt> {
        let now = self.clock.now();

        // ── CHECKS ──────────────────────────────────────────────────────
        let phase = self.epochs.phase(now);
        let SalePhase::Active(epoch) = phase else {
            return Err(LaunchpoolError::NotActive { phase });
        };

        self.whitelist.check(caller)?;

        // A self-purchase would credit records without moving any asset.
        if self.is_reserved(&caller) {
            return Err(LaunchpoolError::Unauthorized(caller));
        }

        if amount == 0 {
            return Err(LaunchpoolError::invalid_amount("amount must be > 0"));
        }

        let pool = self.config.pool;
        let token = self.config.token(allocation);
        let currency = self.config.investment_token;
        let cost = self.pricing.to_investment(
            amount,
            self.config.price(allocation),
            self.ledger.decimals(&token)?,
            self.ledger.decimals(&currency)?,
        )?;
        self.allowance.check(&caller, epoch, cost)?;

        let available = self.ledger.balance_of(&token, &pool)?;
        if available < amount {
            return Err(LaunchpoolError::InsufficientPoolSupply {
                requested: amount,
                available,
            });
        }

        let balance = self.ledger.balance_of(&currency, &caller)?;
        if balance < cost {
            return Err(LaunchpoolError::InsufficientBalance {
                needed: cost,
                available: balance,
            });
        }

        let approved = self.ledger.allowance(&currency, &caller, &pool)?;
        if approved < cost {
            return Err(LaunchpoolError::InsufficientApproval {
                needed: cost,
                approved,
            });
        }

        let previous = self.records.get(&caller).copied();
        let record = previous
            .unwrap_or_default()
            .with_purchase(allocation, amount, cost)
            .ok_or_else(|| LaunchpoolError::overflow("investor record"))?;
        let totals = self
            .totals
            .with_purchase(allocation, amount, cost, previous.is_none())
            .ok_or_else(|| LaunchpoolError::overflow("pool totals"))?;

        let mut inventory = self.inventory.clone();
        inventory.observe(&token, available)?;
        inventory.observe(&currency, self.ledger.balance_of(&currency, &pool)?)?;
        inventory.record_sale(&token, amount)?;
        inventory.record_inflow(&currency, cost)?;

        // ── EFFECTS ─────────────────────────────────────────────────────
        self.allowance.record_investment(caller, cost)?;
        let checkpoint = Checkpoint {
            investor: caller,
            record: previous,
            totals: self.totals,
            inventory: std::mem::replace(&mut self.inventory, inventory),
            cost,
        };
        self.records.insert(caller, record);
        self.totals = totals;

        // ── INTERACTIONS ────────────────────────────────────────────────
        if let Err(err) = self
            .ledger
            .transfer_from(&currency, &pool, &caller, &pool, cost)
        {
            self.rewind(checkpoint);
            return Err(err);
        }
        if let Err(err) = self.ledger.transfer(&token, &pool, &caller, amount) {
            // The approval consumed by the debit is not restored.
            let refund = self.ledger.transfer(&currency, &pool, &caller, cost);
            self.rewind(checkpoint);
            return match refund {
                Ok(()) => Err(err),
                Err(refund_err) => Err(LaunchpoolError::Internal(format!(
                    "purchase by {caller} failed ({err}) and refund of {cost} failed ({refund_err})"
                ))),
            };
        }

        Ok(PurchaseReceipt {
            id: ReceiptId::new(),
            investor: caller,
            allocation,
            tokens: amount,
            cost,
            epoch,
            executed_at: timestamp(now),
        })
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        let Checkpoint {
            investor,
            record,
            totals,
            inventory,
            cost,
        } = checkpoint;
        self.allowance.rewind(&investor, cost);
        match record {
            Some(record) => self.records.insert(investor, record),
            None => self.records.remove(&investor),
        };
        self.totals = totals;
        self.inventory = inventory;
        tracing::warn!(investor = %investor, cost, "Purchase effects rewound");
    }

    // -----------------------------------------------------------------
    // Treasury settlement
    // -----------------------------------------------------------------

    /// Sweep all collected investment currency to the treasury.
    pub fn withdraw_investment_to_treasury(&mut self, caller: Address) -> Result<SettlementReceipt> {
        let ctx = self.sweep_context(caller);
        let result = self.settlement.withdraw_investment(
            &mut self.ledger,
            &mut self.inventory,
            &self.config.pool,
            &self.config.investment_token,
            ctx,
        );
        if let Err(err) = &result {
            tracing::warn!(caller = %caller, code = err.code(), error = %err, "Investment withdrawal rejected");
        }
        result
    }

    /// Sweep all unsold standard and degen inventory to the treasury.
    pub fn withdraw_unclaimed_to_treasury(
        &mut self,
        caller: Address,
    ) -> Result<Vec<SettlementReceipt>> {
        let ctx = self.sweep_context(caller);
        let result = self.settlement.withdraw_unclaimed(
            &mut self.ledger,
            &mut self.inventory,
            &self.config.pool,
            &[self.config.standard_token, self.config.degen_token],
            ctx,
        );
        if let Err(err) = &result {
            tracing::warn!(caller = %caller, code = err.code(), error = %err, "Unclaimed withdrawal rejected");
        }
        result
    }

    fn sweep_context(&self, caller: Address) -> SweepContext {
        let now = self.clock.now();
        SweepContext {
            caller,
            phase: self.epochs.phase(now),
            at: timestamp(now),
        }
    }

    // -----------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------

    /// Check that records, totals, allowance, and live holdings agree.
    ///
    /// Learns operator top-ups of inventory as a side effect.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` describing the first disagreement found.
    pub fn reconcile(&mut self) -> Result<()> {
        let violation = |reason: String| LaunchpoolError::SupplyInvariantViolation { reason };

        let mut summed = PoolTotals::default();
        for (investor, record) in &self.records {
            summed = summed
                .with_purchase(
                    Allocation::Standard,
                    record.standard_tokens_bought,
                    record.amount_invested,
                    true,
                )
                .and_then(|t| t.with_purchase(Allocation::Degen, record.degen_tokens_bought, 0, false))
                .ok_or_else(|| LaunchpoolError::overflow("record sum"))?;
            let invested = self.allowance.invested(investor);
            if invested != record.amount_invested {
                return Err(violation(format!(
                    "investor {investor}: allowance ledger {invested} != record {}",
                    record.amount_invested
                )));
            }
        }
        if summed != self.totals {
            return Err(violation(format!(
                "records sum {summed:?} != running totals {:?}",
                self.totals
            )));
        }
        if self.allowance.total_invested() != self.totals.total_raised {
            return Err(violation(format!(
                "allowance ledger total {} != raised {}",
                self.allowance.total_invested(),
                self.totals.total_raised
            )));
        }

        let pool = self.config.pool;
        for allocation in Allocation::ALL {
            let token = self.config.token(allocation);
            let on_hand = self.ledger.balance_of(&token, &pool)?;
            self.inventory.observe(&token, on_hand)?;
            let sold = self.inventory.entry(&token).sold;
            if sold != self.totals.sold(allocation) {
                return Err(violation(format!(
                    "{allocation}: inventory sold {sold} != records {}",
                    self.totals.sold(allocation)
                )));
            }
        }
        let currency = self.config.investment_token;
        let on_hand = self.ledger.balance_of(&currency, &pool)?;
        self.inventory.observe(&currency, on_hand)?;

        tracing::info!(
            investors = self.records.len(),
            standard_sold = self.totals.standard_sold,
            degen_sold = self.totals.degen_sold,
            total_raised = self.totals.total_raised,
            digest = hex::encode(self.ledger_digest()),
            "Ledger reconciled"
        );
        Ok(())
    }

    /// SHA-256 commitment over the totals and every investor record, in
    /// address order.
    ///
    /// `SHA-256(domain_sep || totals || count || for each record: address || standard || degen || invested)`
    pub fn ledger_digest(&self) -> [u8; 32] {
        let ordered: BTreeMap<&Address, &InvestorRecord> = self.records.iter().collect();
        let mut hasher = Sha256::new();
        hasher.update(b"launchpool:ledger:v1:");
        hasher.update(self.totals.standard_sold.to_le_bytes());
        hasher.update(self.totals.degen_sold.to_le_bytes());
        hasher.update(self.totals.total_raised.to_le_bytes());
        hasher.update(self.totals.investor_count.to_le_bytes());
        hasher.update((ordered.len() as u64).to_le_bytes());
        for (address, record) in ordered {
            hasher.update(address.as_bytes());
            hasher.update(record.standard_tokens_bought.to_le_bytes());
            hasher.update(record.degen_tokens_bought.to_le_bytes());
            hasher.update(record.amount_invested.to_le_bytes());
        }
        hasher.finalize().into()
    }
}

/// Unix seconds as a UTC timestamp; out-of-range values fall back to now.
fn timestamp(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_else(Utc::now)
}

impl<L, C> std::fmt::Debug for LaunchPool<L, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchPool")
            .field("pool", &self.config.pool)
            .field("epochs", &self.epochs)
            .field("whitelist_enabled", &self.whitelist.is_enabled())
            .field("totals", &self.totals)
            .finish_non_exhaustive()
    }
}
