//! Treasury settlement: sweeps pool holdings to the treasury.
//!
//! Two operator-only operations:
//! - [`TreasurySettlement::withdraw_investment`] moves the pool's whole
//!   investment-currency balance.
//! - [`TreasurySettlement::withdraw_unclaimed`] moves the pool's whole
//!   balance of both presale tokens.
//!
//! Both are idempotent in effect: once the pool is drained they succeed
//! with zero-amount receipts. Investor records are never touched.
//!
//! Settlement is phase-aware like a withdraw lock: by default it is only
//! *logged* as premature before `Ended`; with `requires_end` it is refused.
//!
//! A sweep always moves the live balance. An inventory shortfall found on
//! the way is logged at `error` and left for reconciliation to report.

use chrono::{DateTime, Utc};
use launchpool_types::{
    Address, Amount, LaunchpoolError, PresaleConfig, Result, SalePhase, SettlementKind,
    SettlementReceipt,
};

use crate::asset_ledger::AssetLedger;
use crate::supply_conservation::InventoryBook;

/// Who asks for a sweep, and when.
#[derive(Debug, Clone, Copy)]
pub struct SweepContext {
    pub caller: Address,
    pub phase: SalePhase,
    /// Stamped on every receipt the sweep produces.
    pub at: DateTime<Utc>,
}

/// Operator-gated sweeper for pool holdings.
#[derive(Debug, Clone)]
pub struct TreasurySettlement {
    operator: Address,
    treasury: Address,
    requires_end: bool,
}

impl TreasurySettlement {
    #[must_use]
    pub fn new(operator: Address, treasury: Address, requires_end: bool) -> Self {
        Self {
            operator,
            treasury,
            requires_end,
        }
    }

    #[must_use]
    pub fn from_config(config: &PresaleConfig) -> Self {
        Self::new(config.admin, config.treasury, config.settlement_requires_end)
    }

    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    #[must_use]
    pub fn treasury(&self) -> Address {
        self.treasury
    }

    #[must_use]
    pub fn requires_end(&self) -> bool {
        self.requires_end
    }

    /// Hand settlement authority to `new_operator`.
    pub fn set_operator(&mut self, caller: Address, new_operator: Address) -> Result<()> {
        self.authorize(caller)?;
        self.operator = new_operator;
        Ok(())
    }

    fn authorize(&self, caller: Address) -> Result<()> {
        if caller != self.operator {
            return Err(LaunchpoolError::Unauthorized(caller));
        }
        Ok(())
    }

    /// Guard a settlement attempt against the sale phase.
    pub fn check_phase(&self, phase: SalePhase) -> Result<()> {
        if phase.is_ended() {
            return Ok(());
        }
        if self.requires_end {
            return Err(LaunchpoolError::SaleNotEnded { phase });
        }
        tracing::warn!(%phase, "Settlement invoked before the sale ended");
        Ok(())
    }

    /// Sweep the pool's entire investment-currency balance to the treasury.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is not the operator
    /// - `SaleNotEnded` if `requires_end` and the sale is still running
    /// - any error the ledger returns for the transfer (nothing moved)
    pub fn withdraw_investment<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        inventory: &mut InventoryBook,
        pool: &Address,
        asset: &Address,
        ctx: SweepContext,
    ) -> Result<SettlementReceipt> {
        self.authorize(ctx.caller)?;
        self.check_phase(ctx.phase)?;

        let amount = ledger.balance_of(asset, pool)?;
        observe_for_sweep(inventory, asset, amount);
        if amount > 0 {
            ledger.transfer(asset, pool, &self.treasury, amount)?;
            inventory.record_sweep(asset, amount)?;
        }

        let receipt = SettlementReceipt::new(
            SettlementKind::Investment,
            *asset,
            self.treasury,
            amount,
            ctx.at,
        );
        tracing::info!(
            receipt = %receipt.id,
            asset = %asset,
            treasury = %self.treasury,
            amount,
            phase = %ctx.phase,
            "Investment withdrawn to treasury"
        );
        Ok(receipt)
    }

    /// Sweep the pool's entire balance of every asset in `assets` to the
    /// treasury, all or nothing.
    ///
    /// If a later transfer fails, earlier ones are reversed before the error
    /// is returned.
    ///
    /// # Errors
    /// Same as [`withdraw_investment`](Self::withdraw_investment), plus
    /// `Internal` if a reversal itself fails.
    pub fn withdraw_unclaimed<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        inventory: &mut InventoryBook,
        pool: &Address,
        assets: &[Address],
        ctx: SweepContext,
    ) -> Result<Vec<SettlementReceipt>> {
        self.authorize(ctx.caller)?;
        self.check_phase(ctx.phase)?;

        let mut plan: Vec<(Address, Amount)> = Vec::with_capacity(assets.len());
        for asset in assets {
            plan.push((*asset, ledger.balance_of(asset, pool)?));
        }

        let mut moved: Vec<(Address, Amount)> = Vec::with_capacity(plan.len());
        for &(asset, amount) in &plan {
            if amount == 0 {
                continue;
            }
            if let Err(err) = ledger.transfer(&asset, pool, &self.treasury, amount) {
                self.reverse(ledger, pool, &moved)?;
                return Err(err);
            }
            moved.push((asset, amount));
        }

        let mut receipts = Vec::with_capacity(plan.len());
        for (asset, amount) in plan {
            observe_for_sweep(inventory, &asset, amount);
            if amount > 0 {
                inventory.record_sweep(&asset, amount)?;
            }
            let receipt =
                SettlementReceipt::new(SettlementKind::Unclaimed, asset, self.treasury, amount, ctx.at);
            tracing::info!(
                receipt = %receipt.id,
                asset = %asset,
                treasury = %self.treasury,
                amount,
                phase = %ctx.phase,
                "Unclaimed inventory withdrawn to treasury"
            );
            receipts.push(receipt);
        }
        Ok(receipts)
    }

    fn reverse<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        pool: &Address,
        moved: &[(Address, Amount)],
    ) -> Result<()> {
        for (asset, amount) in moved.iter().rev() {
            ledger
                .transfer(asset, &self.treasury, pool, *amount)
                .map_err(|err| {
                    LaunchpoolError::Internal(format!(
                        "failed to reverse sweep of {amount} {asset}: {err}"
                    ))
                })?;
            tracing::warn!(asset = %asset, amount, "Reversed partial sweep");
        }
        Ok(())
    }
}

/// Learn top-ups before a sweep; a shortfall does not block it.
fn observe_for_sweep(inventory: &mut InventoryBook, asset: &Address, on_hand: Amount) {
    if let Err(err) = inventory.observe(asset, on_hand) {
        tracing::error!(
            asset = %asset,
            on_hand,
            code = err.code(),
            error = %err,
            "Inventory mismatch at settlement; sweeping live balance"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_ledger::InMemoryLedger;

    struct Fixture {
        ledger: InMemoryLedger,
        inventory: InventoryBook,
        settlement: TreasurySettlement,
        admin: Address,
        pool: Address,
        fdai: Address,
        pdefire: Address,
        ddefire: Address,
    }

    fn fixture(requires_end: bool) -> Fixture {
        let admin = Address::derive("deployer");
        let treasury = Address::derive("treasury");
        let pool = Address::derive("launchpool");
        let fdai = Address::derive("fDAI");
        let pdefire = Address::derive("pDEFIRE");
        let ddefire = Address::derive("dDEFIRE");
        let mut ledger = InMemoryLedger::new();
        ledger.register(fdai, "fDAI", 18);
        ledger.register(pdefire, "pDEFIRE", 18);
        ledger.register(ddefire, "dDEFIRE", 18);
        ledger.mint(&fdai, &pool, 14_000).unwrap();
        ledger.mint(&pdefire, &pool, 100).unwrap();
        ledger.mint(&ddefire, &pool, 1_500).unwrap();
        Fixture {
            ledger,
            inventory: InventoryBook::new(),
            settlement: TreasurySettlement::new(admin, treasury, requires_end),
            admin,
            pool,
            fdai,
            pdefire,
            ddefire,
        }
    }

    fn at(caller: Address, phase: SalePhase) -> SweepContext {
        SweepContext {
            caller,
            phase,
            at: DateTime::from_timestamp(1_700_259_200, 0).unwrap(),
        }
    }

    impl Fixture {
        fn investment(&mut self, ctx: SweepContext) -> Result<SettlementReceipt> {
            self.settlement
                .withdraw_investment(&mut self.ledger, &mut self.inventory, &self.pool, &self.fdai, ctx)
        }

        fn unclaimed(&mut self, assets: &[Address], ctx: SweepContext) -> Result<Vec<SettlementReceipt>> {
            self.settlement
                .withdraw_unclaimed(&mut self.ledger, &mut self.inventory, &self.pool, assets, ctx)
        }
    }

    #[test]
    fn withdraw_investment_drains_pool() {
        let mut f = fixture(false);
        let receipt = f.investment(at(f.admin, SalePhase::Ended)).unwrap();
        assert_eq!(receipt.amount, 14_000);
        assert_eq!(receipt.kind, SettlementKind::Investment);
        assert_eq!(receipt.executed_at.timestamp(), 1_700_259_200);
        assert_eq!(f.ledger.balance_of(&f.fdai, &f.pool).unwrap(), 0);
        let treasury = f.settlement.treasury();
        assert_eq!(f.ledger.balance_of(&f.fdai, &treasury).unwrap(), 14_000);
        assert!(f.inventory.verify(&f.fdai, 0).is_ok());
    }

    #[test]
    fn second_withdraw_moves_nothing() {
        let mut f = fixture(false);
        for expected in [14_000, 0] {
            let r = f.investment(at(f.admin, SalePhase::Ended)).unwrap();
            assert_eq!(r.amount, expected);
        }
        let treasury = f.settlement.treasury();
        assert_eq!(f.ledger.balance_of(&f.fdai, &treasury).unwrap(), 14_000);
    }

    #[test]
    fn non_operator_rejected() {
        let mut f = fixture(false);
        let mallory = Address::derive("mallory");
        let assets = [f.pdefire, f.ddefire];
        let err = f.unclaimed(&assets, at(mallory, SalePhase::Ended)).unwrap_err();
        assert!(matches!(err, LaunchpoolError::Unauthorized(a) if a == mallory));
        assert_eq!(f.ledger.balance_of(&f.ddefire, &f.pool).unwrap(), 1_500);
    }

    #[test]
    fn withdraw_unclaimed_drains_both_tokens() {
        let mut f = fixture(false);
        let assets = [f.pdefire, f.ddefire];
        let receipts = f.unclaimed(&assets, at(f.admin, SalePhase::Ended)).unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].amount, 100);
        assert_eq!(receipts[1].amount, 1_500);
        assert!(receipts.iter().all(|r| r.executed_at.timestamp() == 1_700_259_200));
        assert_eq!(f.ledger.balance_of(&f.pdefire, &f.pool).unwrap(), 0);
        assert_eq!(f.ledger.balance_of(&f.ddefire, &f.pool).unwrap(), 0);
        assert_eq!(f.inventory.entry(&f.ddefire).swept, 1_500);
    }

    #[test]
    fn shortfall_does_not_block_sweep() {
        let mut f = fixture(false);
        f.inventory.observe(&f.ddefire, 1_500).unwrap();
        f.inventory.observe(&f.fdai, 14_000).unwrap();
        let thief = Address::derive("thief");
        f.ledger.transfer(&f.ddefire, &f.pool, &thief, 300).unwrap();
        f.ledger.transfer(&f.fdai, &f.pool, &thief, 4_000).unwrap();

        let assets = [f.pdefire, f.ddefire];
        let receipts = f.unclaimed(&assets, at(f.admin, SalePhase::Ended)).unwrap();
        assert_eq!(receipts[1].amount, 1_200);
        assert_eq!(f.ledger.balance_of(&f.ddefire, &f.pool).unwrap(), 0);
        assert_eq!(f.investment(at(f.admin, SalePhase::Ended)).unwrap().amount, 10_000);
        assert_eq!(f.ledger.balance_of(&f.fdai, &f.pool).unwrap(), 0);

        // The book still remembers what went missing.
        assert!(f.inventory.verify(&f.ddefire, 0).is_err());
        assert!(f.inventory.verify(&f.fdai, 0).is_err());
    }

    #[test]
    fn early_settlement_allowed_by_default() {
        let mut f = fixture(false);
        assert!(f.investment(at(f.admin, SalePhase::Active(3))).is_ok());
    }

    #[test]
    fn early_settlement_refused_when_required() {
        let mut f = fixture(true);
        let err = f.investment(at(f.admin, SalePhase::Active(3))).unwrap_err();
        assert!(matches!(err, LaunchpoolError::SaleNotEnded { .. }));
        assert_eq!(f.ledger.balance_of(&f.fdai, &f.pool).unwrap(), 14_000);
    }

    #[test]
    fn unknown_asset_moves_nothing() {
        let mut f = fixture(false);
        let ghost = Address::derive("ghost");
        let assets = [f.pdefire, ghost];
        let err = f.unclaimed(&assets, at(f.admin, SalePhase::Ended)).unwrap_err();
        assert!(matches!(err, LaunchpoolError::UnknownAsset(_)));
        assert_eq!(f.ledger.balance_of(&f.pdefire, &f.pool).unwrap(), 100);
    }

    #[test]
    fn operator_handover() {
        let mut f = fixture(false);
        let next = Address::derive("next-operator");
        let mallory = Address::derive("mallory");
        assert!(f.settlement.set_operator(mallory, mallory).is_err());
        f.settlement.set_operator(f.admin, next).unwrap();
        assert_eq!(f.settlement.operator(), next);
        assert!(f.settlement.set_operator(f.admin, f.admin).is_err());
    }
}
