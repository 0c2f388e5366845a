//! End-to-end engine tests: the concrete lifecycle scenarios, equity
//! continuity, summary counters, and abort semantics.

mod common;

use backlab_core::domain::{ExitReason, Signal};
use backlab_core::{Engine, EngineConfig, HoldStrategy, MarketData};
use common::{bar_at, daily_bar, day, ScriptedStrategy, SYMBOL};
use std::sync::atomic::AtomicBool;

fn engine(config: EngineConfig) -> Engine {
    Engine::new(config).unwrap()
}

/// Scenario A: TP1 partial at bar 3, breakeven close of the remainder at
/// bar 5, total realized +$5 on $1,000.
#[test]
fn scenario_a_partial_then_breakeven() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 102.0, 103.0, 101.0, 102.8),
        daily_bar(4, 102.0, 102.3, 101.2, 101.8),
        daily_bar(5, 101.0, 101.5, 100.0, 100.8),
    ])
    .unwrap();

    let mut strategy =
        ScriptedStrategy::new().at(2, Signal::buy(100.5, 98.5, 102.5, 104.5));
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];

    // Sized at (1000 * 0.01) / 2.0 = 5 units.
    assert!((trade.original_size - 5.0).abs() < 1e-10);
    assert_eq!(trade.entry_price, 100.5);

    // TP1 closed half (+$5), remainder exited at breakeven (+$0).
    assert!((trade.realized_pnl - 5.0).abs() < 1e-10);
    assert_eq!(trade.exit_reason, Some(ExitReason::StopLossBreakeven));
    assert_eq!(trade.stop_loss, trade.entry_price);
    assert_eq!(trade.close_time, Some(day(5)));

    assert!((result.final_equity - 1_005.0).abs() < 1e-10);
    assert_eq!(result.equity_curve.len(), 5);
    assert_eq!(result.bar_count, 5);
}

/// Scenario B: direct stop hit before any take-profit.
#[test]
fn scenario_b_direct_stop_loss() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 50.0, 50.5, 49.6, 50.0),
        daily_bar(2, 50.0, 50.2, 49.5, 50.0),
        daily_bar(3, 49.5, 49.8, 48.5, 48.9),
    ])
    .unwrap();

    let mut strategy = ScriptedStrategy::new().at(2, Signal::buy(50.0, 49.0, 52.0, 54.0));
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert!((trade.original_size - 10.0).abs() < 1e-10);
    assert_eq!(trade.exit_reason, Some(ExitReason::StopLoss));
    // 10 units * (50 - 49) = -$10 before costs (and costs are zero here).
    assert!((trade.realized_pnl + 10.0).abs() < 1e-10);
    assert!((result.final_equity - 990.0).abs() < 1e-10);
}

/// Equity continuity: with an all-hold strategy and zero costs, the curve is
/// flat at initial capital with one point per bar.
#[test]
fn all_hold_strategy_keeps_equity_flat() {
    let bars: Vec<_> = (1..=10)
        .map(|d| daily_bar(d, 100.0 + d as f64, 101.5 + d as f64, 99.0 + d as f64, 100.5 + d as f64))
        .collect();
    let data = MarketData::from_bars(bars).unwrap();

    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut HoldStrategy)
        .unwrap();

    assert_eq!(result.equity_curve.len(), 10);
    assert_eq!(result.bar_count, 10);
    for point in &result.equity_curve {
        assert_eq!(point.equity, 1_000.0);
        assert_eq!(point.drawdown_pct, 0.0);
    }
    assert!(result.trades.is_empty());
    assert_eq!(result.summary.positions_opened, 0);
}

/// A position still open at the end of the data force-closes at the last
/// bar's close.
#[test]
fn end_of_data_force_close() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 100.8, 101.4, 100.2, 101.2),
    ])
    .unwrap();

    let mut strategy =
        ScriptedStrategy::new().at(2, Signal::buy(100.5, 98.5, 104.0, 106.0));
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, Some(ExitReason::EndOfData));
    // 5 units * (101.2 - 100.5) = +3.5
    assert!((trade.realized_pnl - 3.5).abs() < 1e-10);
    // The final equity point reflects the booked exit.
    let last = result.equity_curve.last().unwrap();
    assert!((last.equity - result.final_equity).abs() < 1e-10);
}

/// A malformed signal is counted and treated as hold; the run continues.
#[test]
fn malformed_signal_counts_as_fault() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 100.8, 101.4, 100.2, 101.2),
    ])
    .unwrap();

    // Stop above entry on a buy: violates the ordering invariant.
    let mut strategy = ScriptedStrategy::new().at(2, Signal::buy(100.5, 101.0, 102.5, 104.5));
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    assert_eq!(result.summary.strategy_faults, 1);
    assert_eq!(result.summary.positions_opened, 0);
    assert!(result.trades.is_empty());
    assert_eq!(result.bar_count, 3);
}

/// ATR sizing with insufficient history is a sizing skip, not an abort.
#[test]
fn insufficient_atr_history_is_sizing_skip() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 100.8, 101.4, 100.2, 101.2),
    ])
    .unwrap();

    let config = EngineConfig {
        use_atr_sizing: true,
        atr_period: 50,
        ..EngineConfig::frictionless(1_000.0)
    };
    let mut strategy =
        ScriptedStrategy::new().at(2, Signal::buy(100.5, 98.5, 102.5, 104.5));
    let result = engine(config).run(&data, &mut strategy).unwrap();

    assert_eq!(result.summary.signals_skipped_sizing, 1);
    assert!(result.trades.is_empty());
}

/// Size bound: every opened position respects the leverage cap.
#[test]
fn leverage_cap_bounds_position_notional() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 100.8, 101.4, 100.2, 101.2),
    ])
    .unwrap();

    let config = EngineConfig {
        risk_per_trade: 0.9, // would size far past the cap on a tight stop
        ..EngineConfig::frictionless(1_000.0)
    };
    let mut strategy =
        ScriptedStrategy::new().at(2, Signal::buy(100.5, 100.0, 102.5, 104.5));
    let result = engine(config).run(&data, &mut strategy).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert!(trade.original_size * trade.entry_price <= 1_000.0 + 1e-6);
}

/// Tags from the signal land on the position for downstream attribution.
#[test]
fn signal_tags_carried_onto_position() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 100.8, 101.4, 100.2, 101.2),
    ])
    .unwrap();

    let signal = Signal::buy(100.5, 98.5, 102.5, 104.5).with_tag("setup", "breakout");
    let mut strategy = ScriptedStrategy::new().at(2, signal);
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    assert_eq!(result.trades[0].tags.get("setup").map(String::as_str), Some("breakout"));
}

/// Multi-symbol feed: one equity point per timestamp group.
#[test]
fn multi_symbol_equity_curve_per_timestamp() {
    let mut bars = Vec::new();
    for d in 1..=5 {
        bars.push(daily_bar(d, 100.0, 101.0, 99.0, 100.0));
    }
    for d in 2..=6 {
        let mut b = bar_at(day(d), 200.0, 202.0, 198.0, 200.0);
        b.symbol = "ETHUSD".into();
        bars.push(b);
    }
    let data = MarketData::from_bars(bars).unwrap();

    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut HoldStrategy)
        .unwrap();

    // Days 1..=6: six distinct timestamps.
    assert_eq!(result.equity_curve.len(), 6);
    assert_eq!(result.bar_count, 6);
}

/// An abort raised before the first bar yields an empty, consistent result.
#[test]
fn abort_before_start_yields_empty_run() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
    ])
    .unwrap();

    let abort = AtomicBool::new(true);
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run_with_abort(&data, &mut HoldStrategy, &abort)
        .unwrap();

    assert!(result.summary.aborted);
    assert_eq!(result.bar_count, 0);
    assert!(result.equity_curve.is_empty());
    assert!(result.trades.is_empty());
    assert_eq!(result.final_equity, 1_000.0);
}

/// Trade log exposes only `Closed` positions with exhaustive accounting
/// fields; `SYMBOL` constant keeps fixtures honest.
#[test]
fn trade_log_positions_are_finalized() {
    let data = MarketData::from_bars(vec![
        daily_bar(1, 100.0, 101.0, 99.0, 100.0),
        daily_bar(2, 100.0, 101.0, 99.5, 100.4),
        daily_bar(3, 99.5, 99.8, 98.0, 98.4),
    ])
    .unwrap();

    let mut strategy =
        ScriptedStrategy::new().at(2, Signal::buy(100.5, 98.5, 102.5, 104.5));
    let result = engine(EngineConfig::frictionless(1_000.0))
        .run(&data, &mut strategy)
        .unwrap();

    for trade in &result.trades {
        assert_eq!(trade.symbol, SYMBOL);
        assert_eq!(trade.size, 0.0);
        assert!(trade.close_time.is_some());
        assert!(trade.exit_reason.is_some());
    }
}
