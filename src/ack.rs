//! ACK inference.
//!
//! Captures do not say which frames were acknowledged, but the MAC rules
//! make it recoverable: an individually addressed data or management frame
//! is answered by an ACK (or, for an A-MPDU, a block ack) addressed to its
//! transmitter, within a short interval after the frame ends.
//!
//! [`AckInference`] tracks, per transmitter, the most recent frame (or
//! A-MPDU batch) still waiting for an answer. Each observed packet either
//! answers a pending entry, opens a new one, or is ignored.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::dot11::MacAddr;
use crate::packet::Packet;

/// Longest accepted gap between the end of a frame and its ACK.
pub const MAX_ACK_LATENCY_US: u64 = 100;

/// Counters acknowledged by one ACK or block ack.
pub type AckedCounters = SmallVec<[u64; 8]>;

/// Result of an ACK or block ack matching a pending transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckMatch {
    /// Counter of the acknowledging packet
    pub ack: u64,
    pub acked: AckedCounters,
}

#[derive(Debug, Clone)]
struct PendingTx {
    dest: MacAddr,
    ampdu_ref: Option<u32>,
    members: AckedCounters,
    last_end: f64,
}

/// Pairs ACK and block ack frames with the frames they acknowledge.
#[derive(Debug, Clone)]
pub struct AckInference {
    max_latency: f64,
    pending: HashMap<MacAddr, PendingTx>,
}

impl Default for AckInference {
    fn default() -> Self {
        Self::new(MAX_ACK_LATENCY_US)
    }
}

impl AckInference {
    pub fn new(max_latency_us: u64) -> Self {
        Self {
            max_latency: max_latency_us as f64 / 1e6,
            pending: HashMap::new(),
        }
    }

    /// Feed the next packet in trace order.
    ///
    /// Returns the counters acknowledged by `packet` when it is an ACK or
    /// block ack that answers a pending transmission. Frames that expect an
    /// acknowledgment become pending; their `acked` flag is left as decoded.
    pub fn observe(&mut self, packet: &Packet) -> Option<AckMatch> {
        let now = packet.epoch_ts();
        let continued = self.continued_batch(packet);
        self.expire_except(now, continued);

        let header = &packet.header;
        if header.is_ack() {
            let ra = header.receiver();
            if !self.answers(ra, None, now) {
                return None;
            }
            let tx = self.pending.remove(&ra)?;
            let last = *tx.members.last()?;
            tracing::trace!(ack = packet.counter, acked = last, "ack matched");
            return Some(AckMatch {
                ack: packet.counter,
                acked: SmallVec::from_slice(&[last]),
            });
        }

        if header.is_block_ack() {
            let ra = header.receiver();
            if !self.answers(ra, header.transmitter(), now) {
                return None;
            }
            let tx = self.pending.remove(&ra)?;
            tracing::trace!(
                ack = packet.counter,
                members = tx.members.len(),
                "block ack matched"
            );
            return Some(AckMatch {
                ack: packet.counter,
                acked: tx.members,
            });
        }

        if header.expects_ack() {
            if let Some(ta) = header.transmitter() {
                self.track(ta, packet);
            }
        }
        None
    }

    fn answers(&self, ra: MacAddr, ta: Option<MacAddr>, now: f64) -> bool {
        let Some(tx) = self.pending.get(&ra) else {
            return false;
        };
        if ta.is_some_and(|ta| ta != tx.dest) {
            return false;
        }
        (now - tx.last_end).abs() <= self.max_latency
    }

    /// Transmitter whose pending A-MPDU `packet` continues.
    ///
    /// Subframes of one A-MPDU go out back to back whatever their spacing
    /// in the capture, so the batch survives until its block ack.
    fn continued_batch(&self, packet: &Packet) -> Option<MacAddr> {
        let header = &packet.header;
        if packet.phy.ampdu_ref.is_none() || !header.expects_ack() {
            return None;
        }
        let ta = header.transmitter()?;
        let tx = self.pending.get(&ta)?;
        (tx.ampdu_ref == packet.phy.ampdu_ref && tx.dest == header.receiver()).then_some(ta)
    }

    fn track(&mut self, ta: MacAddr, packet: &Packet) {
        let dest = packet.header.receiver();
        let ampdu_ref = packet.phy.ampdu_ref;
        let end = packet.end_epoch_ts();

        if let Some(tx) = self.pending.get_mut(&ta) {
            if ampdu_ref.is_some() && tx.ampdu_ref == ampdu_ref && tx.dest == dest {
                tx.members.push(packet.counter);
                tx.last_end = tx.last_end.max(end);
                return;
            }
        }

        self.pending.insert(
            ta,
            PendingTx {
                dest,
                ampdu_ref,
                members: SmallVec::from_slice(&[packet.counter]),
                last_end: end,
            },
        );
    }

    /// Whether `counter` is still waiting for an acknowledgment.
    pub fn is_pending(&self, counter: u64) -> bool {
        self.pending.values().any(|tx| tx.members.contains(&counter))
    }

    /// Number of transmitters with a pending frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the pending entry containing `counter`.
    pub fn forget(&mut self, counter: u64) {
        self.pending.retain(|_, tx| !tx.members.contains(&counter));
    }

    /// Drop entries that can no longer be answered at `now`.
    pub fn expire(&mut self, now: f64) {
        self.expire_except(now, None);
    }

    fn expire_except(&mut self, now: f64, keep: Option<MacAddr>) {
        let max_latency = self.max_latency;
        self.pending
            .retain(|ta, tx| Some(*ta) == keep || now - tx.last_end <= max_latency);
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawRecord;
    use crate::dot11::header::ack_policy;
    use crate::error::Warnings;
    use crate::io::CaptureBuffer;
    use crate::phy::PhyInfo;
    use crate::test_utils::{Dot11Builder, STA_A, STA_B};
    use bytes::Bytes;

    const T0: f64 = 1_400_000_000.0;

    fn packet(counter: u64, frame: Vec<u8>, start: f64, end: f64, ampdu_ref: Option<u32>) -> Packet {
        let phy = PhyInfo {
            len: frame.len() as u32,
            caplen: frame.len() as u32,
            epoch_ts: start,
            end_epoch_ts: end,
            ampdu_ref,
            ..Default::default()
        };
        let record = RawRecord {
            offset: 0,
            frame_offset: 0,
            frame_len: frame.len(),
            phy,
            warnings: Warnings::new(),
        };
        Packet::decode(counter, record, &CaptureBuffer::Owned(Bytes::from(frame))).unwrap()
    }

    fn data_a_to_b(counter: u64, start: f64) -> Packet {
        packet(counter, Dot11Builder::data().build(), start, start + 200e-6, None)
    }

    #[test]
    fn test_ack_within_bound() {
        let mut acks = AckInference::default();
        let data = data_a_to_b(1, T0);
        assert!(acks.observe(&data).is_none());
        assert!(acks.is_pending(1));

        // ACK 16 us after the data frame ends
        let ack = packet(2, Dot11Builder::ack(STA_A).build(), T0 + 216e-6, T0 + 260e-6, None);
        let matched = acks.observe(&ack).unwrap();
        assert_eq!(matched.ack, 2);
        assert_eq!(matched.acked.as_slice(), &[1]);
        assert!(!acks.is_pending(1));
        assert_eq!(acks.pending_len(), 0);
    }

    #[test]
    fn test_ack_outside_bound_is_ignored() {
        let mut acks = AckInference::default();
        acks.observe(&data_a_to_b(1, T0));

        let ack = packet(2, Dot11Builder::ack(STA_A).build(), T0 + 500e-6, T0 + 540e-6, None);
        assert!(acks.observe(&ack).is_none());
        assert!(!acks.is_pending(1));
    }

    #[test]
    fn test_ack_for_other_station_is_ignored() {
        let mut acks = AckInference::default();
        acks.observe(&data_a_to_b(1, T0));

        let ack = packet(2, Dot11Builder::ack(STA_B).build(), T0 + 210e-6, T0 + 250e-6, None);
        assert!(acks.observe(&ack).is_none());
        assert!(acks.is_pending(1));
    }

    #[test]
    fn test_retransmission_replaces_pending() {
        let mut acks = AckInference::default();
        acks.observe(&data_a_to_b(1, T0));
        acks.observe(&data_a_to_b(2, T0 + 250e-6));
        assert!(!acks.is_pending(1));
        assert!(acks.is_pending(2));

        let ack = packet(3, Dot11Builder::ack(STA_A).build(), T0 + 460e-6, T0 + 500e-6, None);
        assert_eq!(acks.observe(&ack).unwrap().acked.as_slice(), &[2]);
    }

    #[test]
    fn test_block_ack_acknowledges_batch() {
        let mut acks = AckInference::default();
        for (i, counter) in (1..=3).enumerate() {
            let start = T0 + i as f64 * 100e-6;
            let frame = Dot11Builder::qos_data(0).seq(counter as u16).build();
            acks.observe(&packet(counter, frame, start, start + 100e-6, Some(9)));
        }
        assert_eq!(acks.pending_len(), 1);

        let ba = Dot11Builder::block_ack(STA_A, STA_B, 1, 0b111).build();
        let matched = acks
            .observe(&packet(4, ba, T0 + 320e-6, T0 + 350e-6, None))
            .unwrap();
        assert_eq!(matched.acked.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_ampdu_batch_spread_over_air_time() {
        let mut acks = AckInference::default();
        // 1500 byte subframes take about 188 us each at MCS 7; only the last
        // carries a rate, so the others end where they start
        for (i, counter) in (1..=3).enumerate() {
            let start = T0 + i as f64 * 200e-6;
            let end = if counter == 3 { start + 188e-6 } else { start };
            let frame = Dot11Builder::qos_data(0).seq(counter as u16).build();
            acks.observe(&packet(counter, frame, start, end, Some(5)));
            assert_eq!(acks.pending_len(), 1);
        }
        assert!(acks.is_pending(1));

        let ba = Dot11Builder::block_ack(STA_A, STA_B, 1, 0b111).build();
        let matched = acks
            .observe(&packet(4, ba, T0 + 600e-6, T0 + 630e-6, None))
            .unwrap();
        assert_eq!(matched.acked.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_stale_ampdu_batch_is_not_joined_by_other_reference() {
        let mut acks = AckInference::default();
        let frame = Dot11Builder::qos_data(0).build();
        acks.observe(&packet(1, frame.clone(), T0, T0, Some(5)));
        acks.observe(&packet(2, frame, T0 + 300e-6, T0 + 340e-6, Some(6)));
        assert!(!acks.is_pending(1));
        assert!(acks.is_pending(2));
    }

    #[test]
    fn test_block_ack_from_wrong_peer() {
        let mut acks = AckInference::default();
        let frame = Dot11Builder::qos_data(0).build();
        acks.observe(&packet(1, frame, T0, T0 + 100e-6, Some(9)));

        let ba = Dot11Builder::block_ack(STA_A, [0x02; 6], 0, 1).build();
        assert!(acks
            .observe(&packet(2, ba, T0 + 120e-6, T0 + 150e-6, None))
            .is_none());
        assert!(acks.is_pending(1));
    }

    #[test]
    fn test_no_ack_policy_is_not_tracked() {
        let mut acks = AckInference::default();
        let frame = Dot11Builder::qos_data(ack_policy::NO_ACK).build();
        let data = packet(1, frame, T0, T0 + 100e-6, None);
        assert_eq!(data.acked, None);
        acks.observe(&data);
        assert_eq!(acks.pending_len(), 0);
    }

    #[test]
    fn test_broadcast_is_not_tracked() {
        let mut acks = AckInference::default();
        let frame = Dot11Builder::data().addr1([0xff; 6]).build();
        acks.observe(&packet(1, frame, T0, T0 + 100e-6, None));
        assert_eq!(acks.pending_len(), 0);
    }

    #[test]
    fn test_forget_and_clear() {
        let mut acks = AckInference::default();
        acks.observe(&data_a_to_b(1, T0));
        acks.forget(1);
        assert!(!acks.is_pending(1));

        acks.observe(&data_a_to_b(2, T0));
        acks.clear();
        assert_eq!(acks.pending_len(), 0);
    }
}
