//! Packet-filtering demonstration for the defenses module.

use rand::Rng;
use serde::Serialize;

/// Share of generated packets that are malicious.
const MALICIOUS_RATE: f64 = 0.3;
pub const MAX_PACKETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketKind {
    Good,
    Malicious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketStatus {
    Passed,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub id: usize,
    pub kind: PacketKind,
    pub status: PacketStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub firewall_active: bool,
    pub packets: Vec<Packet>,
    pub blocked: usize,
    pub breaches: usize,
}

/// Generates up to `MAX_PACKETS` packets of traffic and filters them.
pub fn simulate<R: Rng>(rng: &mut R, firewall_active: bool, count: usize) -> SimulationReport {
    let packets: Vec<Packet> = (0..count.min(MAX_PACKETS))
        .map(|id| {
            let kind = if rng.gen_bool(MALICIOUS_RATE) {
                PacketKind::Malicious
            } else {
                PacketKind::Good
            };
            let status = filter(kind, firewall_active);
            Packet { id, kind, status }
        })
        .collect();

    let blocked = packets
        .iter()
        .filter(|p| p.status == PacketStatus::Blocked)
        .count();
    let breaches = packets
        .iter()
        .filter(|p| p.kind == PacketKind::Malicious && p.status == PacketStatus::Passed)
        .count();

    SimulationReport {
        firewall_active,
        packets,
        blocked,
        breaches,
    }
}

fn filter(kind: PacketKind, firewall_active: bool) -> PacketStatus {
    match (kind, firewall_active) {
        (PacketKind::Malicious, true) => PacketStatus::Blocked,
        _ => PacketStatus::Passed,
    }
}
