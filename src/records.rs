//! The flow index and flow subscription records and their layouts.
//!
//! ```text
//! FlowIndexData
//!   word 0: | timestamp (32) | flow_rate (96) | deposit (64) | owed_deposit (64) |
//!   word 1: | total_units_pending (128)       | total_units_approved (128)       |
//!
//! FlowSubscriptionData
//!   word 0: | timestamp (32) | flow_rate (96) | units (128)                      |
//!   word 1: | subscription_id (32) | index_id (32) | zero (32) | publisher (160) |
//! ```
//!
//! Most significant bits on the left. `deposit` and `owed_deposit` use
//! [`DEPOSIT_CLIP`]; everything else is stored verbatim.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::address::{Address, ADDRESS_BITS};
use crate::clip::DEPOSIT_CLIP;
use crate::codec::{fields_array, PackedRecord};
use crate::error::PackError;
use crate::layout::{FieldSpec, FieldValue, Layout};
use crate::word::U256;

/// Width of timestamp fields (seconds since the epoch, valid until 2106).
pub const TIMESTAMP_BITS: u32 = 32;

/// Width of flow rate fields.
pub const FLOW_RATE_BITS: u32 = 96;

/// Width of unit count fields.
pub const UNITS_BITS: u32 = 128;

/// Width of identifier fields.
pub const ID_BITS: u32 = 32;

const FLOW_INDEX_FIELDS: &[FieldSpec] = &[
    FieldSpec::unsigned("timestamp", 0, 224, TIMESTAMP_BITS),
    FieldSpec::signed("flow_rate", 0, 128, FLOW_RATE_BITS),
    FieldSpec::clipped("deposit", 0, 64, DEPOSIT_CLIP),
    FieldSpec::clipped("owed_deposit", 0, 0, DEPOSIT_CLIP),
    FieldSpec::unsigned("total_units_pending", 1, 128, UNITS_BITS),
    FieldSpec::unsigned("total_units_approved", 1, 0, UNITS_BITS),
];

/// Layout of [`FlowIndexData`].
pub const FLOW_INDEX_LAYOUT: Layout = Layout::new("FlowIndexData", 2, FLOW_INDEX_FIELDS);

const FLOW_SUBSCRIPTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::unsigned("subscription_id", 1, 224, ID_BITS),
    FieldSpec::signed("flow_rate", 0, 128, FLOW_RATE_BITS),
    FieldSpec::unsigned("units", 0, 0, UNITS_BITS),
    FieldSpec::unsigned("index_id", 1, 192, ID_BITS),
    FieldSpec::unsigned("publisher", 1, 0, ADDRESS_BITS),
    FieldSpec::unsigned("timestamp", 0, 224, TIMESTAMP_BITS),
];

/// Layout of [`FlowSubscriptionData`].
pub const FLOW_SUBSCRIPTION_LAYOUT: Layout =
    Layout::new("FlowSubscriptionData", 2, FLOW_SUBSCRIPTION_FIELDS);

/// Aggregate state of a distribution index at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FlowIndexData {
    /// Seconds since the epoch.
    pub timestamp: u32,
    /// Units per second; must fit in 96 signed bits.
    pub flow_rate: i128,
    /// Deposit held by the index. Stored clipped.
    pub deposit: U256,
    /// Deposit owed to the index. Stored clipped.
    pub owed_deposit: U256,
    /// Units pending approval.
    pub total_units_pending: u128,
    /// Approved units.
    pub total_units_approved: u128,
}

impl PackedRecord for FlowIndexData {
    const LAYOUT: Layout = FLOW_INDEX_LAYOUT;

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Unsigned(U256::from(self.timestamp)),
            FieldValue::Signed(self.flow_rate),
            FieldValue::Amount(self.deposit),
            FieldValue::Amount(self.owed_deposit),
            FieldValue::Unsigned(U256::from(self.total_units_pending)),
            FieldValue::Unsigned(U256::from(self.total_units_approved)),
        ]
    }

    fn from_fields(values: &[FieldValue]) -> Result<Self, PackError> {
        let [timestamp, flow_rate, deposit, owed_deposit, pending, approved] =
            fields_array(&Self::LAYOUT, values)?;
        Ok(FlowIndexData {
            timestamp: timestamp.as_u32().map_err(|e| e.in_field("timestamp"))?,
            flow_rate: flow_rate.as_signed().map_err(|e| e.in_field("flow_rate"))?,
            deposit: deposit.as_amount().map_err(|e| e.in_field("deposit"))?,
            owed_deposit: owed_deposit
                .as_amount()
                .map_err(|e| e.in_field("owed_deposit"))?,
            total_units_pending: pending
                .as_u128()
                .map_err(|e| e.in_field("total_units_pending"))?,
            total_units_approved: approved
                .as_u128()
                .map_err(|e| e.in_field("total_units_approved"))?,
        })
    }
}

/// One subscriber's relationship to an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FlowSubscriptionData {
    /// Caller-assigned identifier, unique within the index.
    pub subscription_id: u32,
    /// Units per second; must fit in 96 signed bits.
    pub flow_rate: i128,
    /// Units held by the subscriber.
    pub units: u128,
    /// Identifier of the parent index.
    pub index_id: u32,
    /// Address of the index publisher.
    pub publisher: Address,
    /// Seconds since the epoch.
    pub timestamp: u32,
}

impl PackedRecord for FlowSubscriptionData {
    const LAYOUT: Layout = FLOW_SUBSCRIPTION_LAYOUT;

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Unsigned(U256::from(self.subscription_id)),
            FieldValue::Signed(self.flow_rate),
            FieldValue::Unsigned(U256::from(self.units)),
            FieldValue::Unsigned(U256::from(self.index_id)),
            FieldValue::Unsigned(self.publisher.to_u256()),
            FieldValue::Unsigned(U256::from(self.timestamp)),
        ]
    }

    fn from_fields(values: &[FieldValue]) -> Result<Self, PackError> {
        let [subscription_id, flow_rate, units, index_id, publisher, timestamp] =
            fields_array(&Self::LAYOUT, values)?;
        Ok(FlowSubscriptionData {
            subscription_id: subscription_id
                .as_u32()
                .map_err(|e| e.in_field("subscription_id"))?,
            flow_rate: flow_rate.as_signed().map_err(|e| e.in_field("flow_rate"))?,
            units: units.as_u128().map_err(|e| e.in_field("units"))?,
            index_id: index_id.as_u32().map_err(|e| e.in_field("index_id"))?,
            publisher: publisher
                .as_unsigned()
                .and_then(Address::from_u256)
                .map_err(|e| e.in_field("publisher"))?,
            timestamp: timestamp.as_u32().map_err(|e| e.in_field("timestamp"))?,
        })
    }
}
