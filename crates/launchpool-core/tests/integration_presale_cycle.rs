//! Integration test: full presale lifecycle
//!
//! NOT_STARTED → ACTIVE(n) → ENDED → treasury settlement
//!
//! Mirrors an operator deployment: three assets are registered, the pool
//! is provisioned with 100 standard and 1 500 degen tokens, investors are
//! funded with 6 000 fDAI and approve the pool, then buy through the sale
//! window before the operator sweeps everything to the treasury.

use launchpool_core::LaunchPool;
use launchpool_ingress::ManualClock;
use launchpool_settlement::{AssetLedger, InMemoryLedger};
use launchpool_types::units::parse_units;
use launchpool_types::*;
use rust_decimal::Decimal;

const START: u64 = 1_700_000_000;

type Pool = LaunchPool<InMemoryLedger, ManualClock>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn deploy(config: PresaleConfig) -> (Pool, ManualClock) {
    init_tracing();
    let mut ledger = InMemoryLedger::new();
    ledger.register(config.standard_token, "pDEFIRE", 18);
    ledger.register(config.degen_token, "dDEFIRE", 18);
    ledger.register(config.investment_token, "fDAI", 18);
    ledger.mint(&config.standard_token, &config.pool, 100).unwrap();
    ledger.mint(&config.degen_token, &config.pool, 1_500).unwrap();
    let clock = ManualClock::new(START - 600);
    let pool = LaunchPool::new(config, ledger, clock.clone()).unwrap();
    (pool, clock)
}

/// Mint 6 000 whole fDAI to `who` and approve the pool for all of it.
fn fund(pool: &mut Pool, who: Address) -> Amount {
    let amount = parse_units(Decimal::new(6_000, 0), 18).unwrap();
    let currency = pool.config().investment_token;
    let spender = pool.config().pool;
    pool.ledger_mut().mint(&currency, &who, amount).unwrap();
    pool.ledger_mut()
        .approve(&currency, &who, &spender, amount)
        .unwrap();
    amount
}

fn pool_balance(pool: &Pool, asset: Address) -> Amount {
    pool.ledger().balance_of(&asset, &pool.config().pool).unwrap()
}

#[test]
fn scenario_a_purchase_before_start_is_not_active() {
    let (mut pool, _clock) = deploy(PresaleConfig::fixture(START));
    let alice = Address::derive("alice");
    fund(&mut pool, alice);

    assert_eq!(pool.phase(), SalePhase::NotStarted);
    assert_eq!(pool.current_epoch(), 0);
    let err = pool.buy_standard(alice, 1).unwrap_err();
    assert!(matches!(
        err,
        LaunchpoolError::NotActive {
            phase: SalePhase::NotStarted
        }
    ));
    assert_eq!(err.code(), 100);
    assert_eq!(pool.check_investor_details(&alice), (0, 0, 0));
}

#[test]
fn scenario_b_whitelist_gates_then_admits() {
    let (mut pool, clock) = deploy(PresaleConfig::fixture(START));
    let admin = pool.admin();
    let bob = Address::derive("bob");
    let funded = fund(&mut pool, bob);
    clock.set(START + 3 * 3600 + 5);

    pool.enable_whitelist(admin, true).unwrap();
    let err = pool.buy_degen(bob, 500).unwrap_err();
    assert!(matches!(err, LaunchpoolError::NotWhitelisted(a) if a == bob));

    assert!(pool.add_whitelist(admin, bob).unwrap());
    let receipt = pool.buy_degen(bob, 500).unwrap();
    assert_eq!(receipt.tokens, 500);
    assert_eq!(receipt.cost, 500 * 25);
    assert_eq!(receipt.epoch, 3);
    assert_eq!(receipt.allocation, Allocation::Degen);

    let currency = pool.config().investment_token;
    let degen = pool.config().degen_token;
    assert_eq!(pool.ledger().balance_of(&currency, &bob).unwrap(), funded - 12_500);
    assert_eq!(pool.ledger().balance_of(&degen, &bob).unwrap(), 500);
    assert_eq!(pool_balance(&pool, degen), 1_000);
    assert_eq!(pool_balance(&pool, currency), 12_500);
}

#[test]
fn scenario_c_sequential_buys_until_allowance_runs_out() {
    let mut config = PresaleConfig::fixture(START);
    config.allowance = AllowancePolicy::Flat { cap: 27_500 };
    let (mut pool, clock) = deploy(config);
    let admin = pool.admin();
    let carol = Address::derive("carol");
    fund(&mut pool, carol);
    pool.enable_whitelist(admin, true).unwrap();
    pool.add_multiple_whitelist(admin, vec![carol, Address::derive("dave")])
        .unwrap();
    clock.set(START);

    pool.buy_degen(carol, 500).unwrap();
    let (_, start_degen, _) = pool.check_investor_details(&carol);
    for amount in [100, 300, 200] {
        clock.advance(3600);
        pool.buy_degen(carol, amount).unwrap();
    }
    let (standard, degen, invested) = pool.check_investor_details(&carol);
    assert_eq!(degen, start_degen + 100 + 300 + 200);
    assert_eq!(degen, 1_100);
    assert_eq!(standard, 0);
    assert_eq!(invested, 27_500);
    assert_eq!(pool.investor_current_buy_allowance(&carol), 0);

    let err = pool.buy_degen(carol, 1).unwrap_err();
    assert!(matches!(
        err,
        LaunchpoolError::AllowanceExceeded {
            requested: 25,
            remaining: 0
        }
    ));
    assert_eq!(pool.check_investor_details(&carol), (0, 1_100, 27_500));
    assert_eq!(pool.totals().degen_sold, 1_100);
    pool.reconcile().unwrap();
}

#[test]
fn scenario_d_settlement_after_end_drains_pool() {
    let (mut pool, clock) = deploy(PresaleConfig::fixture(START));
    let admin = pool.admin();
    let treasury = pool.config().treasury;
    let standard = pool.config().standard_token;
    let degen = pool.config().degen_token;
    let currency = pool.config().investment_token;
    let erin = Address::derive("erin");
    fund(&mut pool, erin);

    clock.set(START + 10);
    pool.buy_standard(erin, 40).unwrap();
    pool.buy_degen(erin, 1_100).unwrap();

    clock.set(pool.epoch_clock().sale_end());
    assert_eq!(pool.phase(), SalePhase::Ended);
    assert_eq!(pool.current_epoch(), 72);
    assert!(matches!(
        pool.buy_standard(erin, 1),
        Err(LaunchpoolError::NotActive {
            phase: SalePhase::Ended
        })
    ));

    let receipts = pool.withdraw_unclaimed_to_treasury(admin).unwrap();
    assert_eq!(receipts.len(), 2);
    let ended_at = i64::try_from(pool.epoch_clock().sale_end()).unwrap();
    assert!(receipts.iter().all(|r| r.executed_at.timestamp() == ended_at));
    assert_eq!(receipts[0].asset, standard);
    assert_eq!(receipts[0].amount, 60);
    assert_eq!(receipts[1].asset, degen);
    assert_eq!(receipts[1].amount, 400);
    assert_eq!(pool_balance(&pool, standard), 0);
    assert_eq!(pool_balance(&pool, degen), 0);
    assert_eq!(pool.ledger().balance_of(&degen, &treasury).unwrap(), 400);

    let raised = 40 * 15 + 1_100 * 25;
    let before = pool.ledger().balance_of(&currency, &treasury).unwrap();
    let receipt = pool.withdraw_investment_to_treasury(admin).unwrap();
    assert_eq!(receipt.amount, raised);
    assert_eq!(receipt.executed_at.timestamp(), ended_at);
    assert_eq!(pool_balance(&pool, currency), 0);
    assert_eq!(
        pool.ledger().balance_of(&currency, &treasury).unwrap(),
        before + raised
    );

    // Records are the permanent history.
    assert_eq!(pool.check_investor_details(&erin), (40, 1_100, raised));
    pool.reconcile().unwrap();
}

#[test]
fn settlement_is_idempotent() {
    let (mut pool, clock) = deploy(PresaleConfig::fixture(START));
    let admin = pool.admin();
    clock.set(pool.epoch_clock().sale_end() + 1);

    let first = pool.withdraw_unclaimed_to_treasury(admin).unwrap();
    let second = pool.withdraw_unclaimed_to_treasury(admin).unwrap();
    assert_eq!(first.iter().map(|r| r.amount).sum::<Amount>(), 1_600);
    assert!(second.iter().all(SettlementReceipt::is_empty));

    let investment = pool.withdraw_investment_to_treasury(admin).unwrap();
    assert!(investment.is_empty());
}

#[test]
fn settlement_is_admin_only() {
    let (mut pool, clock) = deploy(PresaleConfig::fixture(START));
    let mallory = Address::derive("mallory");
    clock.set(pool.epoch_clock().sale_end());

    assert!(matches!(
        pool.withdraw_investment_to_treasury(mallory),
        Err(LaunchpoolError::Unauthorized(_))
    ));
    assert!(matches!(
        pool.withdraw_unclaimed_to_treasury(mallory),
        Err(LaunchpoolError::Unauthorized(_))
    ));
    let degen = pool.config().degen_token;
    assert_eq!(pool_balance(&pool, degen), 1_500);
}

#[test]
fn settlement_mid_sale_depends_on_config() {
    // Default: allowed, logged as premature.
    let (mut pool, clock) = deploy(PresaleConfig::fixture(START));
    let admin = pool.admin();
    clock.set(START + 7_200);
    assert_eq!(pool.withdraw_unclaimed_to_treasury(admin).unwrap().len(), 2);

    // Strict: refused until ENDED.
    let mut config = PresaleConfig::fixture(START);
    config.settlement_requires_end = true;
    let (mut pool, clock) = deploy(config);
    clock.set(START + 7_200);
    assert!(matches!(
        pool.withdraw_unclaimed_to_treasury(admin),
        Err(LaunchpoolError::SaleNotEnded {
            phase: SalePhase::Active(2)
        })
    ));
    clock.set(pool.epoch_clock().sale_end());
    assert!(pool.withdraw_unclaimed_to_treasury(admin).is_ok());
}

#[test]
fn whitelist_ops_are_admin_only_and_idempotent() {
    let (mut pool, _clock) = deploy(PresaleConfig::fixture(START));
    let admin = pool.admin();
    let mallory = Address::derive("mallory");
    let alice = Address::derive("alice");

    assert!(!pool.whitelist_enabled());
    assert!(pool.is_whitelisted(&alice));
    assert!(matches!(
        pool.enable_whitelist(mallory, true),
        Err(LaunchpoolError::Unauthorized(_))
    ));
    assert!(pool.add_whitelist(mallory, mallory).is_err());

    pool.enable_whitelist(admin, true).unwrap();
    assert!(!pool.is_whitelisted(&alice));
    assert!(pool.add_whitelist(admin, alice).unwrap());
    assert!(!pool.add_whitelist(admin, alice).unwrap());
    assert_eq!(pool.whitelist_len(), 1);
    assert!(pool.remove_whitelist(admin, alice).unwrap());
    assert!(!pool.remove_whitelist(admin, alice).unwrap());
    assert_eq!(pool.whitelist_len(), 0);

    let too_many: Vec<Address> = (0..=constants::MAX_WHITELIST_BATCH)
        .map(|i| Address::derive(&format!("investor-{i}")))
        .collect();
    assert!(matches!(
        pool.add_multiple_whitelist(admin, too_many),
        Err(LaunchpoolError::WhitelistBatchTooLarge { .. })
    ));
    assert_eq!(pool.whitelist_len(), 0);
}

#[test]
fn config_loaded_from_json_drives_pool() {
    let json = PresaleConfig::fixture(START).to_json_pretty().unwrap();
    let config = PresaleConfig::from_json_str(&json).unwrap();
    let (pool, clock) = deploy(config);
    clock.set(START + 71 * 3600);
    assert_eq!(pool.phase(), SalePhase::Active(71));
    clock.advance(3600);
    assert_eq!(pool.phase(), SalePhase::Ended);
}
