//! `smsbridge-dispatch` — the SMS dispatch engine.
//!
//! Takes normalized [`SmsRequest`]s from the server boundary and drives them
//! to the gateway: encode the pipe-delimited wire line(s), choose the
//! single-send or batch-upload path, run the outbound call, interpret the
//! gateway's status field, and classify the result as one
//! [`DispatchOutcome`].
//!
//! [`SmsRequest`]: smsbridge_core::SmsRequest
//! [`DispatchOutcome`]: smsbridge_core::DispatchOutcome

pub mod artifact;
pub mod client;
pub mod dispatch;
pub mod encode;
pub mod normalize;

pub use artifact::{ArtifactHandle, ArtifactStore};
pub use client::{BitmessageClient, GatewayClient, GatewayResponse, MockGatewayClient};
pub use dispatch::{DispatchReport, Dispatcher};
pub use normalize::normalize_arguments;
