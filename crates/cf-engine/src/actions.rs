//! Data action processing: state mutations and computed template values.

use chrono::{Datelike, NaiveDate};

use cf_core::{DataAction, DataActionType, StateStore, StateValue};

use crate::clock::{Clock, SystemClock};
use crate::config::FlowConfig;
use crate::error::{EngineError, EngineResult};

/// Today as `YYYY-MM-DD`.
pub const TODAY_DATE: &str = "TODAY_DATE";
/// The nearest future active day as `YYYY-MM-DD`.
pub const NEXT_ACTIVE_DATE: &str = "NEXT_ACTIVE_DATE";
/// The ISO weekday (1-7) of the nearest future active day.
pub const NEXT_ACTIVE_WEEKDAY: &str = "NEXT_ACTIVE_WEEKDAY";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Applies data actions to persisted state.
pub struct DataActionProcessor {
    clock: Box<dyn Clock>,
    active_days_key: String,
    default_active_days: Vec<u32>,
}

impl std::fmt::Debug for DataActionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataActionProcessor")
            .field("active_days_key", &self.active_days_key)
            .field("default_active_days", &self.default_active_days)
            .finish()
    }
}

impl DataActionProcessor {
    /// Create a processor using the system clock.
    pub fn new(config: &FlowConfig) -> Self {
        Self {
            clock: Box::new(SystemClock),
            active_days_key: config.active_days_key.clone(),
            default_active_days: config.default_active_days.clone(),
        }
    }

    /// Replace the clock.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Apply one action.
    pub fn apply(&self, action: &DataAction, state: &mut dyn StateStore) -> EngineResult<()> {
        let key = action.key.trim();
        if key.is_empty() {
            return Err(invalid(&action.key, "empty key"));
        }

        match action.action_type {
            DataActionType::Set => {
                let raw = action
                    .value
                    .as_ref()
                    .ok_or_else(|| invalid(key, "set requires a value"))?;
                let value = self.resolve_value(raw, state);
                tracing::debug!(key, value = %value, "set");
                state.set(key, value)?;
            }
            DataActionType::Increment | DataActionType::Decrement => {
                let delta = match &action.value {
                    None => StateValue::Integer(1),
                    Some(v) if v.is_number() => v.clone(),
                    Some(v) => {
                        return Err(invalid(
                            key,
                            &format!("delta must be numeric, got {}", v.type_name()),
                        ));
                    }
                };
                let negate = action.action_type == DataActionType::Decrement;
                let current = state.get(key).unwrap_or_default();
                let next = step(&current, &delta, negate)
                    .ok_or_else(|| invalid(key, "numeric overflow"))?;
                tracing::debug!(key, value = %next, "{}", action.action_type);
                state.set(key, next)?;
            }
            DataActionType::Reset => match state.get(key) {
                Some(current) if !current.is_null() => {
                    state.set(key, current.zero_like())?;
                }
                _ => state.remove(key)?,
            },
        }
        Ok(())
    }

    /// Resolve a template function name to its value; other values pass
    /// through unchanged.
    pub fn resolve_value(&self, value: &StateValue, state: &dyn StateStore) -> StateValue {
        let Some(name) = value.as_str() else {
            return value.clone();
        };
        match name {
            TODAY_DATE => StateValue::String(self.clock.today().format(DATE_FORMAT).to_string()),
            NEXT_ACTIVE_DATE => StateValue::String(
                self.next_active_date(state)
                    .format(DATE_FORMAT)
                    .to_string(),
            ),
            NEXT_ACTIVE_WEEKDAY => StateValue::Integer(i64::from(
                self.next_active_date(state).weekday().number_from_monday(),
            )),
            _ => value.clone(),
        }
    }

    /// The nearest date after today whose weekday is active.
    pub fn next_active_date(&self, state: &dyn StateStore) -> NaiveDate {
        let today = self.clock.today();
        let active = self.active_days(state);
        let mut date = today;
        for _ in 0..7 {
            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
            if active.contains(&date.weekday().number_from_monday()) {
                return date;
            }
        }
        today.succ_opt().unwrap_or(today)
    }

    /// Active ISO weekdays from state, else the configured defaults.
    pub fn active_days(&self, state: &dyn StateStore) -> Vec<u32> {
        let from_state: Vec<u32> = state
            .get(&self.active_days_key)
            .and_then(|v| v.as_list().map(|items| items.iter().filter_map(weekday_number).collect()))
            .unwrap_or_default();
        if from_state.is_empty() {
            self.default_active_days.clone()
        } else {
            from_state
        }
    }
}

fn invalid(key: &str, reason: &str) -> EngineError {
    EngineError::InvalidAction {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// `current ± delta`, treating non-numeric `current` as 0. Integer state
/// stays integer when the delta is integral, including `2.0`.
fn step(current: &StateValue, delta: &StateValue, negate: bool) -> Option<StateValue> {
    let base = if current.is_number() {
        current.clone()
    } else {
        StateValue::Integer(0)
    };
    match (&base, integral(delta)) {
        (StateValue::Integer(a), Some(d)) => {
            let result = if negate {
                a.checked_sub(d)
            } else {
                a.checked_add(d)
            };
            result.map(StateValue::Integer)
        }
        _ => {
            let a = base.as_f64()?;
            let d = delta.as_f64()?;
            Some(StateValue::Float(if negate { a - d } else { a + d }))
        }
    }
}

fn integral(value: &StateValue) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    match value {
        StateValue::Integer(n) => Some(*n),
        StateValue::Float(f) if f.fract() == 0.0 && f.abs() <= LIMIT => Some(*f as i64),
        _ => None,
    }
}

fn weekday_number(value: &StateValue) -> Option<u32> {
    match value {
        StateValue::Integer(n) if (1..=7).contains(n) => u32::try_from(*n).ok(),
        StateValue::String(s) => {
            if let Ok(n) = s.trim().parse::<u32>() {
                return (1..=7).contains(&n).then_some(n);
            }
            let lower = s.trim().to_lowercase();
            let days = [
                "monday",
                "tuesday",
                "wednesday",
                "thursday",
                "friday",
                "saturday",
                "sunday",
            ];
            days.iter()
                .position(|d| lower.len() >= 3 && d.starts_with(lower.as_str()))
                .map(|i| i as u32 + 1)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use cf_core::MemoryStateStore;

    /// 2024-05-15 is a Wednesday.
    fn wednesday() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap())
    }

    fn processor() -> DataActionProcessor {
        DataActionProcessor::new(&FlowConfig::default()).with_clock(wednesday())
    }

    #[test]
    fn set_overwrites() {
        let p = processor();
        let mut state = MemoryStateStore::new().with("user.name", "old");
        p.apply(&DataAction::set("user.name", "Ana"), &mut state).unwrap();
        assert_eq!(state.get("user.name"), Some(StateValue::from("Ana")));
    }

    #[test]
    fn set_today_date() {
        let p = processor();
        let mut state = MemoryStateStore::new();
        p.apply(&DataAction::set("test.date", "TODAY_DATE"), &mut state)
            .unwrap();
        assert_eq!(state.get("test.date"), Some(StateValue::from("2024-05-15")));
    }

    #[test]
    fn non_template_values_pass_through() {
        let p = processor();
        let mut state = MemoryStateStore::new();
        p.apply(&DataAction::set("a", "today_date"), &mut state).unwrap();
        p.apply(&DataAction::set("b", "42"), &mut state).unwrap();
        p.apply(&DataAction::set("c", 42), &mut state).unwrap();
        assert_eq!(state.get("a"), Some(StateValue::from("today_date")));
        assert_eq!(state.get("b"), Some(StateValue::from("42")));
        assert_eq!(state.get("c"), Some(StateValue::Integer(42)));
    }

    #[test]
    fn next_active_date_defaults_to_tomorrow() {
        let p = processor();
        let mut state = MemoryStateStore::new();
        p.apply(&DataAction::set("next", NEXT_ACTIVE_DATE), &mut state)
            .unwrap();
        p.apply(&DataAction::set("weekday", NEXT_ACTIVE_WEEKDAY), &mut state)
            .unwrap();
        assert_eq!(state.get("next"), Some(StateValue::from("2024-05-16")));
        assert_eq!(state.get("weekday"), Some(StateValue::Integer(4)));
    }

    #[test]
    fn next_active_date_skips_to_active_weekday() {
        let p = processor();
        let mut state = MemoryStateStore::new().with(
            "user.activeDays",
            StateValue::List(vec![StateValue::Integer(1), StateValue::from("fri")]),
        );
        assert_eq!(
            p.next_active_date(&state),
            NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
        );

        state
            .set("user.activeDays", StateValue::List(vec![StateValue::from("Monday")]))
            .unwrap();
        assert_eq!(
            p.next_active_date(&state),
            NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
        );
    }

    #[test]
    fn next_active_date_is_never_today() {
        let p = processor();
        let state = MemoryStateStore::new().with(
            "user.activeDays",
            StateValue::List(vec![StateValue::Integer(3)]),
        );
        assert_eq!(
            p.next_active_date(&state),
            NaiveDate::from_ymd_opt(2024, 5, 22).unwrap()
        );
    }

    #[test]
    fn invalid_active_days_fall_back_to_defaults() {
        let p = DataActionProcessor::new(&FlowConfig::default().with_default_active_days([6]))
            .with_clock(wednesday());
        let state = MemoryStateStore::new().with(
            "user.activeDays",
            StateValue::List(vec![StateValue::Integer(12), StateValue::from("xx")]),
        );
        assert_eq!(p.active_days(&state), vec![6]);
        assert_eq!(
            p.next_active_date(&state),
            NaiveDate::from_ymd_opt(2024, 5, 18).unwrap()
        );
    }

    #[test]
    fn increment_and_decrement() {
        let p = processor();
        let mut state = MemoryStateStore::new().with("user.streak", 2);
        p.apply(&DataAction::increment("user.streak"), &mut state).unwrap();
        assert_eq!(state.get("user.streak"), Some(StateValue::Integer(3)));

        p.apply(&DataAction::decrement("user.streak").with_value(5), &mut state)
            .unwrap();
        assert_eq!(state.get("user.streak"), Some(StateValue::Integer(-2)));

        p.apply(&DataAction::increment("user.streak").with_value(0.5), &mut state)
            .unwrap();
        assert_eq!(state.get("user.streak"), Some(StateValue::Float(-1.5)));
    }

    #[test]
    fn integral_float_delta_keeps_integer() {
        let p = processor();
        let mut state = MemoryStateStore::new().with("user.streak", 2);
        p.apply(&DataAction::increment("user.streak").with_value(2.0), &mut state)
            .unwrap();
        assert_eq!(state.get("user.streak"), Some(StateValue::Integer(4)));

        p.apply(&DataAction::decrement("user.streak").with_value(1.0), &mut state)
            .unwrap();
        assert_eq!(state.get("user.streak"), Some(StateValue::Integer(3)));

        let mut floats = MemoryStateStore::new().with("score", 1.5);
        p.apply(&DataAction::increment("score").with_value(1.0), &mut floats)
            .unwrap();
        assert_eq!(floats.get("score"), Some(StateValue::Float(2.5)));
    }

    #[test]
    fn increment_treats_missing_and_non_numeric_as_zero() {
        let p = processor();
        let mut state = MemoryStateStore::new().with("user.count", "lots");
        p.apply(&DataAction::increment("user.count"), &mut state).unwrap();
        p.apply(&DataAction::increment("user.fresh"), &mut state).unwrap();
        assert_eq!(state.get("user.count"), Some(StateValue::Integer(1)));
        assert_eq!(state.get("user.fresh"), Some(StateValue::Integer(1)));
    }

    #[test]
    fn reset_writes_type_zero_or_removes() {
        let p = processor();
        let mut state = MemoryStateStore::new()
            .with("n", 9)
            .with("b", true)
            .with("s", "text")
            .with("nil", StateValue::Null);
        for key in ["n", "b", "s", "nil", "missing"] {
            p.apply(&DataAction::reset(key), &mut state).unwrap();
        }
        assert_eq!(state.get("n"), Some(StateValue::Integer(0)));
        assert_eq!(state.get("b"), Some(StateValue::Bool(false)));
        assert_eq!(state.get("s"), Some(StateValue::from("")));
        assert_eq!(state.get("nil"), None);
        assert_eq!(state.get("missing"), None);
    }

    #[test]
    fn invalid_actions_error() {
        let p = processor();
        let mut state = MemoryStateStore::new();
        assert!(matches!(
            p.apply(&DataAction::set(" ", 1), &mut state),
            Err(EngineError::InvalidAction { .. })
        ));
        assert!(matches!(
            p.apply(&DataAction::increment("x").with_value("two"), &mut state),
            Err(EngineError::InvalidAction { .. })
        ));
        let mut bare_set = DataAction::set("x", 1);
        bare_set.value = None;
        assert!(p.apply(&bare_set, &mut state).is_err());
        assert!(state.is_empty());
    }

    #[test]
    fn weekday_names_and_numbers() {
        assert_eq!(weekday_number(&StateValue::from("tue")), Some(2));
        assert_eq!(weekday_number(&StateValue::from("Sunday")), Some(7));
        assert_eq!(weekday_number(&StateValue::from("5")), Some(5));
        assert_eq!(weekday_number(&StateValue::Integer(0)), None);
        assert_eq!(weekday_number(&StateValue::from("mo")), None);
    }
}
