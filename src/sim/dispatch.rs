//! Per-hour dispatch rules.
//!
//! Each rule is a pure function that takes the hour's [`HourState`] and
//! returns an updated copy. The engine applies them in priority order:
//! [`charge_from_surplus`], then [`arbitrage`], then [`shave_peak`], and
//! finally [`HourState::settle`] to produce the next hour's SOC.

use super::types::{PriceWindow, StorageConfig};

/// Energy moved by each rule during one hour (kWh, all non-negative).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourFlows {
    /// PV surplus stored, after efficiency losses.
    pub self_consumption_kwh: f64,
    /// Grid energy drawn in a cheap hour, before efficiency losses.
    pub arbitrage_charge_kwh: f64,
    pub arbitrage_discharge_kwh: f64,
    pub peak_shaving_kwh: f64,
}

/// Storage state threaded through the rules within one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourState {
    /// SOC at the start of the hour (kWh).
    pub soc_kwh: f64,
    /// Room left below `soc_max` after this hour's moves so far.
    pub headroom_kwh: f64,
    /// Energy left above `soc_min` after this hour's moves so far.
    pub dischargeable_kwh: f64,
    /// Unused charge power this hour (kW, equal to kWh at hourly steps).
    pub charge_power_left_kw: f64,
    /// Unused discharge power this hour.
    pub discharge_power_left_kw: f64,
    /// Net energy applied so far (positive = charge).
    pub net_kwh: f64,
    pub flows: HourFlows,
}

impl HourState {
    /// Opens an hour at `soc_kwh` with the full power budget available.
    pub fn begin(soc_kwh: f64, storage: &StorageConfig) -> Self {
        Self {
            soc_kwh,
            headroom_kwh: (storage.soc_max_kwh() - soc_kwh).max(0.0),
            dischargeable_kwh: (soc_kwh - storage.soc_min_kwh()).max(0.0),
            charge_power_left_kw: storage.power_kw.max(0.0),
            discharge_power_left_kw: storage.power_kw.max(0.0),
            net_kwh: 0.0,
            flows: HourFlows::default(),
        }
    }

    /// SOC carried into the next hour, clamped to `[soc_min, soc_max]`.
    pub fn settle(&self, storage: &StorageConfig) -> f64 {
        (self.soc_kwh + self.net_kwh)
            .max(storage.soc_min_kwh())
            .min(storage.soc_max_kwh())
    }

    fn store(mut self, drawn_kwh: f64, rte: f64) -> (Self, f64) {
        let stored = drawn_kwh * rte;
        self.headroom_kwh = (self.headroom_kwh - stored).max(0.0);
        self.dischargeable_kwh += stored;
        self.charge_power_left_kw = (self.charge_power_left_kw - drawn_kwh).max(0.0);
        self.net_kwh += stored;
        (self, stored)
    }

    fn release(mut self, out_kwh: f64) -> Self {
        self.dischargeable_kwh = (self.dischargeable_kwh - out_kwh).max(0.0);
        self.headroom_kwh += out_kwh;
        self.discharge_power_left_kw = (self.discharge_power_left_kw - out_kwh).max(0.0);
        self.net_kwh -= out_kwh;
        self
    }
}

/// Stores PV surplus, limited by headroom (grossed up for losses) and power.
pub fn charge_from_surplus(state: HourState, surplus_kwh: f64, rte: f64) -> HourState {
    if rte <= 0.0 {
        return state;
    }
    let draw = surplus_kwh
        .min(state.headroom_kwh / rte)
        .min(state.charge_power_left_kw)
        .max(0.0);
    if draw <= 0.0 {
        return state;
    }
    let (mut next, stored) = state.store(draw, rte);
    next.flows.self_consumption_kwh += stored;
    next
}

/// Charges from the grid in cheap hours and discharges in expensive hours.
///
/// Charging only sees the headroom and power left after
/// [`charge_from_surplus`].
pub fn arbitrage(state: HourState, window: PriceWindow, rte: f64) -> HourState {
    match window {
        PriceWindow::Cheap if rte > 0.0 => {
            let draw = (state.headroom_kwh / rte)
                .min(state.charge_power_left_kw)
                .max(0.0);
            if draw <= 0.0 {
                return state;
            }
            let (mut next, _) = state.store(draw, rte);
            next.flows.arbitrage_charge_kwh += draw;
            next
        }
        PriceWindow::Expensive => {
            let out = state
                .dischargeable_kwh
                .min(state.discharge_power_left_kw)
                .max(0.0);
            if out <= 0.0 {
                return state;
            }
            let mut next = state.release(out);
            next.flows.arbitrage_discharge_kwh += out;
            next
        }
        PriceWindow::Cheap | PriceWindow::Neutral => state,
    }
}

/// Discharges to bring load down to `threshold_kw`.
///
/// Skipped when load is at or below the threshold, or when the hour has
/// already been a net charging hour.
pub fn shave_peak(state: HourState, load_kw: f64, threshold_kw: f64) -> HourState {
    if load_kw <= threshold_kw || state.net_kwh > 0.0 {
        return state;
    }
    let out = (load_kw - threshold_kw)
        .min(state.dischargeable_kwh)
        .min(state.discharge_power_left_kw)
        .max(0.0);
    if out <= 0.0 {
        return state;
    }
    let mut next = state.release(out);
    next.flows.peak_shaving_kwh += out;
    next
}
