//! Core value types and contract bindings.

mod contracts;
pub use contracts::{
    BridgeRequest, IERC20, ISedn, MiddlewareRequest, UserRequest, minimal_forwarder, sedn_forwarder,
};

mod intent;
pub use intent::{ChainFunds, FundingScenario, FundingState, Recipient, TransferIntent};

mod plan;
pub use plan::{DescriptorStatus, SednCall, TransactionDescriptor, TransactionPlan};

mod secret;
pub use secret::{Secret, Solution};
