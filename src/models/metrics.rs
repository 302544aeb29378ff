//! Metric identities and snapshot data model

use crate::types::Direction;
use serde::Serialize;

/// Prefix shared by every exported metric name
pub const METRIC_PREFIX: &str = "mail_health_exporter__";

/// Monotonic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    SendInternalToExternalSuccess,
    SendInternalToExternalFailures,
    ReceiveInternalToExternalSuccess,
    ReceiveInternalToExternalFailures,
    SendExternalToInternalSuccess,
    SendExternalToInternalFailures,
    ReceiveExternalToInternalSuccess,
    ReceiveExternalToInternalFailures,
}

/// Point-in-time values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    SendingMailsWorking,
    ReceivingMailsWorking,
    RoundtripDurationSeconds,
    LastSendReceiveCheckTimestamp,
    SpamScore,
    LastSpamScoreCheckTimestamp,
}

/// Whether a probe step is a submission or a mailbox poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Send,
    Receive,
}

impl Counter {
    pub const COUNT: usize = 8;

    /// All counters in exposition order
    pub const ALL: [Counter; Self::COUNT] = [
        Counter::SendInternalToExternalSuccess,
        Counter::SendInternalToExternalFailures,
        Counter::ReceiveInternalToExternalSuccess,
        Counter::ReceiveInternalToExternalFailures,
        Counter::SendExternalToInternalSuccess,
        Counter::SendExternalToInternalFailures,
        Counter::ReceiveExternalToInternalSuccess,
        Counter::ReceiveExternalToInternalFailures,
    ];

    /// Counter recording the outcome of `step` in `direction`
    pub fn for_outcome(step: Step, direction: Direction, success: bool) -> Self {
        use Counter::*;
        match (step, direction, success) {
            (Step::Send, Direction::InternalToExternal, true) => SendInternalToExternalSuccess,
            (Step::Send, Direction::InternalToExternal, false) => SendInternalToExternalFailures,
            (Step::Receive, Direction::InternalToExternal, true) => ReceiveInternalToExternalSuccess,
            (Step::Receive, Direction::InternalToExternal, false) => ReceiveInternalToExternalFailures,
            (Step::Send, Direction::ExternalToInternal, true) => SendExternalToInternalSuccess,
            (Step::Send, Direction::ExternalToInternal, false) => SendExternalToInternalFailures,
            (Step::Receive, Direction::ExternalToInternal, true) => ReceiveExternalToInternalSuccess,
            (Step::Receive, Direction::ExternalToInternal, false) => ReceiveExternalToInternalFailures,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Name without the common prefix
    pub fn short_name(self) -> &'static str {
        match self {
            Counter::SendInternalToExternalSuccess => "send_internal_to_external_success_total",
            Counter::SendInternalToExternalFailures => "send_internal_to_external_failures_total",
            Counter::ReceiveInternalToExternalSuccess => "receive_internal_to_external_success_total",
            Counter::ReceiveInternalToExternalFailures => "receive_internal_to_external_failures_total",
            Counter::SendExternalToInternalSuccess => "send_external_to_internal_success_total",
            Counter::SendExternalToInternalFailures => "send_external_to_internal_failures_total",
            Counter::ReceiveExternalToInternalSuccess => "receive_external_to_internal_success_total",
            Counter::ReceiveExternalToInternalFailures => "receive_external_to_internal_failures_total",
        }
    }

    pub fn name(self) -> String {
        format!("{}{}", METRIC_PREFIX, self.short_name())
    }

    pub fn help(self) -> &'static str {
        match self {
            Counter::SendInternalToExternalSuccess => "Total successful mail sends from internal to external",
            Counter::SendInternalToExternalFailures => "Total failed mail sends from internal to external",
            Counter::ReceiveInternalToExternalSuccess => "Total successful mail receives from internal to external",
            Counter::ReceiveInternalToExternalFailures => "Total failed mail receives from internal to external",
            Counter::SendExternalToInternalSuccess => "Total successful mail sends from external to internal",
            Counter::SendExternalToInternalFailures => "Total failed mail sends from external to internal",
            Counter::ReceiveExternalToInternalSuccess => "Total successful mail receives from external to internal",
            Counter::ReceiveExternalToInternalFailures => "Total failed mail receives from external to internal",
        }
    }
}

impl Gauge {
    pub const COUNT: usize = 6;

    /// All gauges in exposition order
    pub const ALL: [Gauge; Self::COUNT] = [
        Gauge::SendingMailsWorking,
        Gauge::ReceivingMailsWorking,
        Gauge::RoundtripDurationSeconds,
        Gauge::LastSendReceiveCheckTimestamp,
        Gauge::SpamScore,
        Gauge::LastSpamScoreCheckTimestamp,
    ];

    /// Working gauge for a probe step
    pub fn working(step: Step) -> Self {
        match step {
            Step::Send => Gauge::SendingMailsWorking,
            Step::Receive => Gauge::ReceivingMailsWorking,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Gauge::SendingMailsWorking => "sending_mails_working",
            Gauge::ReceivingMailsWorking => "receiving_mails_working",
            Gauge::RoundtripDurationSeconds => "roundtrip_duration_seconds",
            Gauge::LastSendReceiveCheckTimestamp => "last_send_receive_check_timestamp",
            Gauge::SpamScore => "spam_score",
            Gauge::LastSpamScoreCheckTimestamp => "last_spam_score_check_timestamp",
        }
    }

    pub fn name(self) -> String {
        format!("{}{}", METRIC_PREFIX, self.short_name())
    }

    pub fn help(self) -> &'static str {
        match self {
            Gauge::SendingMailsWorking => "Status whether the server is able to send mails or not",
            Gauge::ReceivingMailsWorking => "Status whether the server is able to receive mails or not",
            Gauge::RoundtripDurationSeconds => "Duration of last full internal->external->internal mail roundtrip",
            Gauge::LastSendReceiveCheckTimestamp => "Timestamp of last send-receive check",
            Gauge::SpamScore => "Spam score of send mails",
            Gauge::LastSpamScoreCheckTimestamp => "Timestamp of last spam-score check",
        }
    }
}

/// Consistent copy of every metric value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub(crate) counters: [u64; Counter::COUNT],
    pub(crate) gauges: [f64; Gauge::COUNT],
}

impl MetricsSnapshot {
    /// Initial values: counters at zero, working gauges optimistic, timestamps at `now`
    pub fn initial(now_epoch_seconds: f64) -> Self {
        let mut gauges = [0.0; Gauge::COUNT];
        gauges[Gauge::SendingMailsWorking.index()] = 1.0;
        gauges[Gauge::ReceivingMailsWorking.index()] = 1.0;
        gauges[Gauge::LastSendReceiveCheckTimestamp.index()] = now_epoch_seconds;
        gauges[Gauge::LastSpamScoreCheckTimestamp.index()] = now_epoch_seconds;

        Self {
            counters: [0; Counter::COUNT],
            gauges,
        }
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters[counter.index()]
    }

    pub fn gauge(&self, gauge: Gauge) -> f64 {
        self.gauges[gauge.index()]
    }

    /// Values exposed to the status page
    pub fn status(&self) -> StatusData {
        let check_timestamp = self.gauge(Gauge::LastSendReceiveCheckTimestamp);
        StatusData {
            sending_works: self.gauge(Gauge::SendingMailsWorking) != 0.0,
            receiving_works: self.gauge(Gauge::ReceivingMailsWorking) != 0.0,
            spam_score: self.gauge(Gauge::SpamScore) as u8,
            last_updated: LastUpdated {
                sending: check_timestamp,
                receiving: check_timestamp,
                spam: self.gauge(Gauge::LastSpamScoreCheckTimestamp),
            },
        }
    }
}

/// `mailServerData` object of the HTML status page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub sending_works: bool,
    pub receiving_works: bool,
    pub spam_score: u8,
    pub last_updated: LastUpdated,
}

/// Epoch seconds of the checks behind each status field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastUpdated {
    pub sending: f64,
    pub receiving: f64,
    pub spam: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_and_prefixed() {
        let mut names = HashSet::new();
        for counter in Counter::ALL {
            assert!(counter.name().starts_with(METRIC_PREFIX));
            assert!(counter.name().ends_with("_total"));
            assert!(names.insert(counter.name()));
        }
        for gauge in Gauge::ALL {
            assert!(gauge.name().starts_with(METRIC_PREFIX));
            assert!(names.insert(gauge.name()));
        }
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn test_index_matches_position() {
        for (i, counter) in Counter::ALL.iter().enumerate() {
            assert_eq!(counter.index(), i);
        }
        for (i, gauge) in Gauge::ALL.iter().enumerate() {
            assert_eq!(gauge.index(), i);
        }
    }

    #[test]
    fn test_counter_for_outcome() {
        assert_eq!(
            Counter::for_outcome(Step::Send, Direction::InternalToExternal, false),
            Counter::SendInternalToExternalFailures
        );
        assert_eq!(
            Counter::for_outcome(Step::Receive, Direction::ExternalToInternal, true),
            Counter::ReceiveExternalToInternalSuccess
        );
    }

    #[test]
    fn test_initial_snapshot() {
        let snapshot = MetricsSnapshot::initial(1_700_000_000.0);
        for counter in Counter::ALL {
            assert_eq!(snapshot.counter(counter), 0);
        }
        assert_eq!(snapshot.gauge(Gauge::SendingMailsWorking), 1.0);
        assert_eq!(snapshot.gauge(Gauge::ReceivingMailsWorking), 1.0);
        assert_eq!(snapshot.gauge(Gauge::SpamScore), 0.0);
        assert_eq!(snapshot.gauge(Gauge::LastSpamScoreCheckTimestamp), 1_700_000_000.0);
    }

    #[test]
    fn test_status_mirrors_page_object() {
        let mut snapshot = MetricsSnapshot::initial(10.0);
        snapshot.gauges[Gauge::ReceivingMailsWorking.index()] = 0.0;
        snapshot.gauges[Gauge::SpamScore.index()] = 7.0;
        snapshot.gauges[Gauge::LastSpamScoreCheckTimestamp.index()] = 20.5;

        let json = serde_json::to_value(snapshot.status()).unwrap();
        assert_eq!(json["sendingWorks"], true);
        assert_eq!(json["receivingWorks"], false);
        assert_eq!(json["spamScore"], 7);
        assert_eq!(json["lastUpdated"]["sending"], 10.0);
        assert_eq!(json["lastUpdated"]["receiving"], 10.0);
        assert_eq!(json["lastUpdated"]["spam"], 20.5);
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
