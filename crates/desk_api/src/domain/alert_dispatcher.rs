use crate::domain::DashboardSnapshot;
use chrono::{DateTime, Utc};
use common::domain::{Alert, AlertKind, AlertNotifier, Posture, Settings};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Alert dispatcher configuration
#[derive(Debug, Clone)]
pub struct AlertDispatcherConfig {
    pub co2_cooldown: Duration,
    pub posture_cooldown: Duration,
    pub send_timeout: Duration,
}

impl Default for AlertDispatcherConfig {
    fn default() -> Self {
        Self {
            co2_cooldown: Duration::from_secs(6),
            posture_cooldown: Duration::from_secs(6),
            send_timeout: Duration::from_secs(5),
        }
    }
}

/// Last-fired timestamp for one alert kind, in epoch milliseconds
struct Cooldown {
    last_fired_ms: AtomicI64,
    period_ms: i64,
}

impl Cooldown {
    const NEVER: i64 = i64::MIN;

    fn new(period: Duration) -> Self {
        Self {
            last_fired_ms: AtomicI64::new(Self::NEVER),
            period_ms: i64::try_from(period.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Claim the slot if the period has elapsed. Only one caller can win a
    /// given window; the claim sticks whether or not the send succeeds.
    fn try_claim(&self, now_ms: i64) -> bool {
        let mut last = self.last_fired_ms.load(Ordering::Acquire);
        loop {
            if last != Self::NEVER && now_ms.saturating_sub(last) <= self.period_ms {
                return false;
            }
            match self.last_fired_ms.compare_exchange_weak(
                last,
                now_ms,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Decides which alerts a snapshot warrants and sends them in the background.
///
/// Cooldown state lives in memory only, so a restart forgets when alerts
/// last fired.
pub struct AlertDispatcher {
    notifier: Arc<dyn AlertNotifier>,
    co2: Cooldown,
    posture: Cooldown,
    send_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn AlertNotifier>, config: AlertDispatcherConfig) -> Self {
        Self {
            notifier,
            co2: Cooldown::new(config.co2_cooldown),
            posture: Cooldown::new(config.posture_cooldown),
            send_timeout: config.send_timeout,
        }
    }

    /// Evaluate the rules for `snapshot` at `now`, claiming the cooldown slot
    /// of every alert returned.
    pub fn evaluate_at(
        &self,
        snapshot: &DashboardSnapshot,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        if settings.mute_alerts {
            debug!("alerts muted, skipping evaluation");
            return Vec::new();
        }

        let now_ms = now.timestamp_millis();
        let mut alerts = Vec::new();

        if let Some(co2) = snapshot.co2 {
            if co2 > settings.co2_threshold && self.co2.try_claim(now_ms) {
                alerts.push(Alert {
                    kind: AlertKind::Co2,
                    message: format!(
                        "CO₂ level is {} ppm (threshold {} ppm). Open a window!",
                        co2, settings.co2_threshold
                    ),
                });
            }
        }

        if snapshot.desk_occupied
            && snapshot.posture == Posture::Bad
            && self.posture.try_claim(now_ms)
        {
            alerts.push(Alert {
                kind: AlertKind::Posture,
                message: format!(
                    "Bad posture detected at {}. Sit up straight!",
                    snapshot.device_id
                ),
            });
        }

        alerts
    }

    /// Send each alert on its own task. Failures and timeouts are logged and
    /// never retried.
    pub fn dispatch(&self, alerts: Vec<Alert>) -> Vec<JoinHandle<()>> {
        alerts
            .into_iter()
            .map(|alert| {
                let notifier = Arc::clone(&self.notifier);
                let send_timeout = self.send_timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(send_timeout, notifier.notify(&alert)).await {
                        Ok(Ok(())) => info!(kind = %alert.kind, "alert sent"),
                        Ok(Err(e)) => warn!(kind = %alert.kind, error = %e, "alert delivery failed"),
                        Err(_) => warn!(
                            kind = %alert.kind,
                            timeout_ms = send_timeout.as_millis() as u64,
                            "alert delivery timed out"
                        ),
                    }
                })
            })
            .collect()
    }

    /// Evaluate and dispatch in one step; used on every dashboard request
    pub fn on_snapshot(
        &self,
        snapshot: &DashboardSnapshot,
        settings: &Settings,
    ) -> Vec<JoinHandle<()>> {
        let alerts = self.evaluate_at(snapshot, settings, Utc::now());
        self.dispatch(alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use common::domain::{DomainError, MockAlertNotifier};

    fn snapshot(co2: f64, occupied: bool, posture: Posture) -> DashboardSnapshot {
        DashboardSnapshot {
            device_id: "desk-001".to_string(),
            desk_occupied: occupied,
            co2: Some(co2),
            room_temp: Some(23.5),
            posture,
            co2_trend: vec![Some(co2)],
            occ_timeline: vec![u8::from(occupied)],
        }
    }

    fn dispatcher(notifier: MockAlertNotifier) -> AlertDispatcher {
        AlertDispatcher::new(Arc::new(notifier), AlertDispatcherConfig::default())
    }

    #[test]
    fn test_co2_above_threshold_fires_once_per_cooldown() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let settings = Settings::default();
        let high = snapshot(850.0, false, Posture::Ok);
        let t0 = Utc::now();

        let first = dispatcher.evaluate_at(&high, &settings, t0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, AlertKind::Co2);
        assert!(first[0].message.contains("850"));

        for secs in 1..=6 {
            let later = dispatcher.evaluate_at(&high, &settings, t0 + TimeDelta::seconds(secs));
            assert!(later.is_empty(), "fired again after {}s", secs);
        }

        let after = dispatcher.evaluate_at(&high, &settings, t0 + TimeDelta::seconds(7));
        assert_eq!(after.len(), 1);
        assert!(after[0].message.contains("850"));
    }

    #[test]
    fn test_co2_at_threshold_does_not_fire() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let alerts =
            dispatcher.evaluate_at(&snapshot(800.0, false, Posture::Ok), &Settings::default(), Utc::now());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_co2_message_format() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let alerts =
            dispatcher.evaluate_at(&snapshot(850.0, false, Posture::Ok), &Settings::default(), Utc::now());
        assert_eq!(
            alerts[0].message,
            "CO₂ level is 850 ppm (threshold 800 ppm). Open a window!"
        );
    }

    #[test]
    fn test_posture_requires_occupied_desk() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let settings = Settings::default();
        let now = Utc::now();

        assert!(dispatcher
            .evaluate_at(&snapshot(400.0, false, Posture::Bad), &settings, now)
            .is_empty());

        let alerts = dispatcher.evaluate_at(&snapshot(400.0, true, Posture::Bad), &settings, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Posture);
    }

    #[test]
    fn test_kinds_have_independent_cooldowns() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let settings = Settings::default();
        let t0 = Utc::now();

        let co2_only = dispatcher.evaluate_at(&snapshot(900.0, false, Posture::Ok), &settings, t0);
        assert_eq!(co2_only.len(), 1);

        let both = dispatcher.evaluate_at(
            &snapshot(900.0, true, Posture::Bad),
            &settings,
            t0 + TimeDelta::seconds(1),
        );
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].kind, AlertKind::Posture);
    }

    #[test]
    fn test_mute_suppresses_both_kinds_without_claiming() {
        let dispatcher = dispatcher(MockAlertNotifier::new());
        let muted = Settings {
            mute_alerts: true,
            ..Settings::default()
        };
        let bad = snapshot(1200.0, true, Posture::Bad);
        let now = Utc::now();

        assert!(dispatcher.evaluate_at(&bad, &muted, now).is_empty());

        // Unmuting right away fires both, muted requests left no claim behind
        let alerts = dispatcher.evaluate_at(&bad, &Settings::default(), now);
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn test_concurrent_claims_fire_once() {
        let dispatcher = Arc::new(dispatcher(MockAlertNotifier::new()));
        let settings = Settings::default();
        let high = snapshot(900.0, false, Posture::Ok);
        let now = Utc::now();

        let fired: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let dispatcher = Arc::clone(&dispatcher);
                    let settings = settings.clone();
                    let high = high.clone();
                    scope.spawn(move || dispatcher.evaluate_at(&high, &settings, now).len())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(fired, 1);
    }

    #[tokio::test]
    async fn test_dispatch_sends_each_alert() {
        let mut notifier = MockAlertNotifier::new();
        notifier
            .expect_notify()
            .withf(|alert: &Alert| alert.kind == AlertKind::Co2 && alert.message.contains("850"))
            .times(1)
            .returning(|_| Ok(()));

        let dispatcher = dispatcher(notifier);
        let handles = dispatcher.on_snapshot(&snapshot(850.0, false, Posture::Ok), &Settings::default());
        assert_eq!(handles.len(), 1);
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let mut notifier = MockAlertNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(DomainError::NotificationError("503".to_string())));

        let dispatcher = dispatcher(notifier);
        let handles = dispatcher.on_snapshot(&snapshot(850.0, false, Posture::Ok), &Settings::default());
        for handle in handles {
            assert!(handle.await.is_ok());
        }

        // Failed send keeps the slot claimed
        let again = dispatcher.evaluate_at(
            &snapshot(850.0, false, Posture::Ok),
            &Settings::default(),
            Utc::now(),
        );
        assert!(again.is_empty());
    }

    /// Notifier whose send never completes
    struct StalledNotifier;

    #[async_trait::async_trait]
    impl AlertNotifier for StalledNotifier {
        async fn notify(&self, _alert: &Alert) -> common::domain::DomainResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stalled_send_is_bounded_by_send_timeout() {
        let dispatcher = AlertDispatcher::new(
            Arc::new(StalledNotifier),
            AlertDispatcherConfig {
                send_timeout: Duration::from_millis(50),
                ..AlertDispatcherConfig::default()
            },
        );

        let handles =
            dispatcher.on_snapshot(&snapshot(850.0, true, Posture::Bad), &Settings::default());
        assert_eq!(handles.len(), 2);

        for handle in handles {
            let joined = tokio::time::timeout(Duration::from_secs(1), handle).await;
            assert!(matches!(joined, Ok(Ok(()))), "send outlived its timeout");
        }
    }
}
