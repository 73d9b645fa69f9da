//! Domain model shared by the gateway and the view-state layer.
//!
//! Wire structs mirror the contract's tuple field names exactly (the
//! contract speaks Spanish); everything above the wire uses English.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Permission level stored on the ledger, one per address.
///
/// Ordinal meaning is fixed by the contract: 0=None, 1=Student,
/// 2=Instructor, 3=Admin. Local code must not reorder or reinterpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    None = 0,
    Student = 1,
    Instructor = 2,
    Admin = 3,
}

impl Role {
    /// Decode the raw ordinal the contract returns.
    ///
    /// Unknown ordinals fold to `None`, consistent with the fail-soft
    /// read policy.
    pub fn from_ordinal(ordinal: u64) -> Role {
        match ordinal {
            0 => Role::None,
            1 => Role::Student,
            2 => Role::Instructor,
            3 => Role::Admin,
            other => {
                warn!(ordinal = other, "unknown role ordinal, treating as None");
                Role::None
            }
        }
    }

    pub fn as_ordinal(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::None => "none",
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts either the role label or its ordinal ("instructor" or "2").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(Role::None),
            "student" | "1" => Ok(Role::Student),
            "instructor" | "2" => Ok(Role::Instructor),
            "admin" | "3" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A standing offer to tutor a subject at a price, as mirrored from the
/// ledger. `id` is the offer's storage index on the contract and is the
/// only stable identity the interface exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutoringOffer {
    pub id: u64,
    pub tutor: String,
    pub subject: String,
    pub price: u64,
    pub active: bool,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// A tutoring transaction between a student and a tutor.
///
/// The ledger keeps no status field; records mirrored from it are always
/// `Completed`. `Pending`/`Cancelled` exist only for local placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutoringRecord {
    pub student: String,
    pub tutor: String,
    pub subject: String,
    pub tokens: u64,
    pub timestamp: u64,
    pub status: SessionStatus,
}

// ─────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────

/// `getOferta` / `getOfertasActivas` tuple, field names as the contract
/// returns them.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireOffer {
    pub tutor: String,
    #[serde(rename = "materia")]
    pub subject: String,
    #[serde(rename = "precio")]
    pub price: u64,
    #[serde(rename = "activa")]
    pub active: bool,
    pub timestamp: u64,
}

impl WireOffer {
    pub fn into_offer(self, id: u64) -> TutoringOffer {
        TutoringOffer {
            id,
            tutor: self.tutor,
            subject: self.subject,
            price: self.price,
            active: self.active,
            timestamp: self.timestamp,
        }
    }
}

/// `getTutorias` tuple.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireRecord {
    #[serde(rename = "estudiante")]
    pub student: String,
    pub tutor: String,
    #[serde(rename = "materia")]
    pub subject: String,
    pub tokens: u64,
    pub timestamp: u64,
}

impl From<WireRecord> for TutoringRecord {
    fn from(wire: WireRecord) -> Self {
        TutoringRecord {
            student: wire.student,
            tutor: wire.tutor,
            subject: wire.subject,
            tokens: wire.tokens,
            timestamp: wire.timestamp,
            status: SessionStatus::Completed,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────

/// The five notification topics the contract emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    TokensAssigned,
    OfferCreated,
    OfferCancelled,
    TutoringPaid,
    TokensRedeemed,
}

impl EventTopic {
    pub const ALL: [EventTopic; 5] = [
        EventTopic::TokensAssigned,
        EventTopic::OfferCreated,
        EventTopic::OfferCancelled,
        EventTopic::TutoringPaid,
        EventTopic::TokensRedeemed,
    ];
}

/// A decoded ledger notification. Tagged by the contract's event names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    TokensAssigned {
        to: String,
        amount: u64,
    },
    #[serde(rename = "OfertaCreada")]
    OfferCreated {
        tutor: String,
        #[serde(rename = "materia")]
        subject: String,
        #[serde(rename = "precio")]
        price: u64,
    },
    #[serde(rename = "OfertaCancelada")]
    OfferCancelled {
        tutor: String,
        #[serde(rename = "ofertaId")]
        offer_id: u64,
    },
    TutoringPaid {
        from: String,
        to: String,
        amount: u64,
        #[serde(rename = "materia")]
        subject: String,
    },
    TokensRedeemed {
        user: String,
        benefit: String,
    },
}

impl LedgerEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            LedgerEvent::TokensAssigned { .. } => EventTopic::TokensAssigned,
            LedgerEvent::OfferCreated { .. } => EventTopic::OfferCreated,
            LedgerEvent::OfferCancelled { .. } => EventTopic::OfferCancelled,
            LedgerEvent::TutoringPaid { .. } => EventTopic::TutoringPaid,
            LedgerEvent::TokensRedeemed { .. } => EventTopic::TokensRedeemed,
        }
    }
}
