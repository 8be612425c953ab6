//! View state derived from channel events.
//!
//! [`ViewState::apply`] is the fold every consumer of the push channels has
//! to use: wallets and price ticks replace, open-trade deltas merge, and a
//! closed trade moves from the open set to a bounded recent-trades list.
//! [`ViewBinding`] wires the fold to an [`EventBus`].

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{DashboardSnapshot, PriceEntry, PriceTick, TradeRecord, WalletSnapshot};
use crate::ws::{ErrorKind, Event, EventBus, EventKind, Handler, Notification};

/// Maximum number of closed trades kept in [`ViewState::recent_trades`].
pub const RECENT_TRADES_CAP: usize = 10;

/// Event kinds the reducer folds.
const FOLDED_KINDS: [EventKind; 6] = [
    EventKind::WalletData,
    EventKind::OpenTrades,
    EventKind::TradeUpdate,
    EventKind::PriceUpdate,
    EventKind::TradeExecuted,
    EventKind::Error,
];

/// Derived view of one user's trading session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Latest wallet snapshot.
    pub wallet: Option<WalletSnapshot>,
    /// Open trades, newest first.
    pub open_trades: Vec<TradeRecord>,
    /// Recently closed trades, newest first, at most [`RECENT_TRADES_CAP`].
    pub recent_trades: VecDeque<TradeRecord>,
    /// Latest price per instrument key.
    pub prices: HashMap<String, PriceEntry>,
    /// Dashboard statistics, as sent by the REST endpoint.
    pub statistics: Option<serde_json::Value>,
    /// Time of the last state change.
    pub last_update: Option<DateTime<Utc>>,
}

impl ViewState {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the view.
    ///
    /// Returns the notification the event asks the presentation layer to
    /// show, if any.
    pub fn apply(&mut self, event: &Event) -> Option<Notification> {
        match event {
            Event::WalletData(wallet) => {
                self.wallet = Some(wallet.clone());
                self.touch();
                None
            }
            Event::OpenTrades(trades) => {
                self.open_trades = trades.clone();
                self.touch();
                None
            }
            Event::TradeUpdate(trade) if trade.is_closed() => self.close_trade(trade),
            Event::TradeUpdate(trade) => {
                self.upsert_open(trade.clone());
                None
            }
            // Broadcast to every user; the open set only follows this user's
            // trading channel.
            Event::TradeExecuted(trade) => Some(Notification::info(format!(
                "Trade executed: {}",
                trade.symbol()
            ))),
            Event::PriceUpdate(tick) => {
                self.apply_price(tick);
                None
            }
            Event::Error(err) => match err.kind {
                ErrorKind::Application | ErrorKind::Exhausted => {
                    Some(Notification::error(format!("Error: {}", err.message)))
                }
                ErrorKind::Transport | ErrorKind::Protocol => {
                    debug!(error = %err, "channel error, no notification");
                    None
                }
            },
            Event::Notification(_) => None,
        }
    }

    /// Replaces the view with a dashboard snapshot from the REST endpoint.
    ///
    /// Prices are kept; the snapshot does not carry them.
    pub fn apply_dashboard(&mut self, snapshot: DashboardSnapshot) {
        self.wallet = snapshot.wallet;
        self.open_trades = snapshot.open_positions;
        self.recent_trades = snapshot
            .recent_trades
            .into_iter()
            .take(RECENT_TRADES_CAP)
            .collect();
        self.statistics = snapshot.statistics;
        self.touch();
    }

    /// Renders the view in the dashboard snapshot shape.
    #[must_use]
    pub fn to_dashboard(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            wallet: self.wallet.clone(),
            open_positions: self.open_trades.clone(),
            recent_trades: self.recent_trades.iter().cloned().collect(),
            statistics: self.statistics.clone(),
        }
    }

    /// Returns the open trade with `id`.
    #[must_use]
    pub fn open_trade(&self, id: u64) -> Option<&TradeRecord> {
        self.open_trades.iter().find(|t| t.id == id)
    }

    /// Returns the latest price for `instrument_key`.
    #[must_use]
    pub fn price(&self, instrument_key: &str) -> Option<&PriceEntry> {
        self.prices.get(instrument_key)
    }

    /// Returns the unrealized pnl of `trade` at the latest known price.
    #[must_use]
    pub fn unrealized_pnl(&self, trade: &TradeRecord) -> Option<Decimal> {
        let key = trade.instrument_key.as_deref()?;
        let entry = self.prices.get(key)?;
        trade.unrealized_pnl(entry.price)
    }

    /// Returns the summed unrealized pnl of every open trade with a known price.
    #[must_use]
    pub fn total_unrealized_pnl(&self) -> Decimal {
        self.open_trades
            .iter()
            .filter_map(|t| self.unrealized_pnl(t))
            .sum()
    }

    fn touch(&mut self) {
        self.last_update = Some(Utc::now());
    }

    fn upsert_open(&mut self, trade: TradeRecord) {
        match self.open_trades.iter_mut().find(|t| t.id == trade.id) {
            Some(existing) => *existing = trade,
            None => self.open_trades.insert(0, trade),
        }
        self.touch();
    }

    fn close_trade(&mut self, delta: &TradeRecord) -> Option<Notification> {
        let Some(index) = self.open_trades.iter().position(|t| t.id == delta.id) else {
            debug!(trade_id = delta.id, "ignoring close for unknown trade");
            return None;
        };

        let mut closed = self.open_trades.remove(index);
        closed.merge(delta);

        let message = match closed.exit_reason.as_deref() {
            Some(reason) => format!(
                "Trade {} closed: ₹{:.2} ({})",
                closed.symbol(),
                closed.pnl.unwrap_or_default(),
                reason
            ),
            None => format!(
                "Trade {} closed: ₹{:.2}",
                closed.symbol(),
                closed.pnl.unwrap_or_default()
            ),
        };

        self.recent_trades.push_front(closed);
        self.recent_trades.truncate(RECENT_TRADES_CAP);
        self.touch();

        Some(Notification::info(message))
    }

    fn apply_price(&mut self, tick: &PriceTick) {
        self.prices.insert(tick.instrument_key.clone(), tick.entry());
        self.touch();
    }
}

/// A [`ViewState`] kept up to date by an [`EventBus`].
///
/// Notifications produced by the fold are re-emitted on the bus as
/// [`Event::Notification`]. Every handler registered by [`attach`](Self::attach)
/// is removed by [`detach`](Self::detach) or on drop.
pub struct ViewBinding {
    bus: EventBus,
    state: Arc<Mutex<ViewState>>,
    handler: Handler,
    attached: bool,
}

impl std::fmt::Debug for ViewBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBinding")
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}

impl ViewBinding {
    /// Subscribes an empty view to `bus`.
    #[must_use]
    pub fn attach(bus: &EventBus) -> Self {
        Self::attach_with(bus, ViewState::default())
    }

    /// Subscribes `initial` to `bus`.
    #[must_use]
    pub fn attach_with(bus: &EventBus, initial: ViewState) -> Self {
        let state = Arc::new(Mutex::new(initial));

        let handler = {
            let state = Arc::clone(&state);
            let bus = bus.clone();
            EventBus::handler(move |event| {
                let notification = state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(event);
                if let Some(notification) = notification {
                    bus.emit(&Event::Notification(notification));
                }
            })
        };

        for kind in FOLDED_KINDS {
            bus.on(kind, &handler);
        }

        Self {
            bus: bus.clone(),
            state,
            handler,
            attached: true,
        }
    }

    /// Returns a copy of the current view.
    #[must_use]
    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    /// Runs `f` against the current view without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&*self.lock())
    }

    /// Seeds or reconciles the view from a dashboard snapshot.
    pub fn apply_dashboard(&self, snapshot: DashboardSnapshot) {
        self.lock().apply_dashboard(snapshot);
    }

    /// Returns true while the view is subscribed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Unsubscribes every handler this binding registered.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        for kind in FOLDED_KINDS {
            self.bus.off(kind, &self.handler);
        }
        self.attached = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ViewBinding {
    fn drop(&mut self) {
        self.detach();
    }
}
