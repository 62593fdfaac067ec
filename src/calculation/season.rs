//! Energy period selection for seasonal tariffs.

use crate::models::{ChargeStructure, Season};

/// Picks the energy period that represents `season` for a charge structure.
///
/// [`Season::Default`] means period 0. Summer and winter take the period
/// that appears most often in the July or January row of the weekday
/// schedule, with ties going to the lower period. If there is no schedule,
/// or the chosen period has no tiers defined, the lowest period present is
/// used instead. Returns `None` only when the tariff has no energy periods.
///
/// # Example
///
/// ```
/// use urdb_rates::calculation::select_energy_period;
/// use urdb_rates::models::{ChargeStructure, EnergyPeriod, Season};
///
/// let mut charges = ChargeStructure::default();
/// charges.energy_periods = vec![
///     EnergyPeriod { index: 0, tiers: vec![] },
///     EnergyPeriod { index: 1, tiers: vec![] },
/// ];
/// let mut schedule = vec![vec![0; 24]; 12];
/// schedule[6] = vec![1; 24];
/// charges.weekday_schedule = Some(schedule);
///
/// assert_eq!(select_energy_period(&charges, Season::Summer), Some(1));
/// assert_eq!(select_energy_period(&charges, Season::Winter), Some(0));
/// ```
pub fn select_energy_period(charges: &ChargeStructure, season: Season) -> Option<usize> {
    let lowest = charges.energy_periods.iter().map(|p| p.index).min()?;

    let preferred = match season.schedule_month() {
        None => Some(0),
        Some(month) => charges
            .weekday_schedule
            .as_ref()
            .and_then(|schedule| schedule.get(month))
            .and_then(|row| dominant_period(row)),
    };

    match preferred {
        Some(index) if charges.period(index).is_some() => Some(index),
        _ => Some(lowest),
    }
}

/// Most frequent value in a schedule row; ties resolve to the smaller period.
fn dominant_period(row: &[usize]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for &period in row {
        match counts.iter_mut().find(|(p, _)| *p == period) {
            Some((_, n)) => *n += 1,
            None => counts.push((period, 1)),
        }
    }
    counts
        .into_iter()
        .max_by(|(pa, na), (pb, nb)| na.cmp(nb).then(pb.cmp(pa)))
        .map(|(period, _)| period)
}
