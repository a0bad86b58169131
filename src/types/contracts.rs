//! Bindings for the external on-chain collaborators.

use alloy::sol;
use serde::{Deserialize, Serialize};

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 amount);

        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function increaseAllowance(address spender, uint256 addedValue) external returns (bool);
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// Middleware leg of a bridge route, executed before the bridge hop.
    ///
    /// `id` selects the middleware implementation registered with the bridge
    /// aggregator; a zero `id` means no middleware step.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct MiddlewareRequest {
        uint256 id;
        uint256 optionalNativeAmount;
        address inputToken;
        bytes data;
    }

    /// Bridge leg of a route.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct BridgeRequest {
        uint256 id;
        uint256 optionalNativeAmount;
        address inputToken;
        bytes data;
    }

    /// Routing payload consumed by `bridgeWithdraw` and `bridgeClaim`.
    ///
    /// Mirrors the bridge aggregator's user request: who receives, on which
    /// chain, how much, and the middleware/bridge sub-requests that encode the
    /// externally computed route.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct UserRequest {
        address receiverAddress;
        uint256 toChainId;
        uint256 amount;
        MiddlewareRequest middlewareRequest;
        BridgeRequest bridgeRequest;
    }

    #[sol(rpc)]
    #[derive(Debug)]
    interface ISedn {
        /// Pulls `amount` of the external token from the caller and credits a
        /// known recipient's in-protocol balance.
        function sednKnown(uint256 amount, address to) external;

        /// Pulls `amount` of the external token from the caller and locks it
        /// against `secret` for a not-yet-known recipient.
        function sednUnknown(uint256 amount, bytes32 secret) external;

        /// Moves `amount` of already-deposited balance to a known recipient.
        function transferKnown(uint256 amount, address to) external;

        /// Locks `amount` of already-deposited balance against `secret`.
        function transferUnknown(uint256 amount, bytes32 secret) external;

        /// Covers `amount` by pulling tokens and `balanceAmount` from the
        /// caller's deposited balance, crediting a known recipient.
        function hybridKnown(uint256 amount, uint256 balanceAmount, address to) external;

        /// Hybrid funding variant of `sednUnknown`.
        function hybridUnknown(uint256 amount, uint256 balanceAmount, bytes32 secret) external;

        /// Pays out `amount` of the caller's deposited balance to `to` in the
        /// external token, on this chain.
        function withdraw(uint256 amount, address to) external;

        /// Pays out deposited balance through the named bridge implementation
        /// towards another chain, following `userRequest`.
        function bridgeWithdraw(uint256 amount, UserRequest calldata userRequest, address bridgeImpl) external;

        /// Releases the value locked against `secret` to the receiver named in
        /// the verifier-signed authorization `(till, v, r, s)`, provided
        /// `keccak256(solution)` matches `secret`.
        function claim(string calldata solution, bytes32 secret, uint256 till, uint8 v, bytes32 r, bytes32 s) external;

        /// Claims like `claim` and immediately routes the released value
        /// through the named bridge implementation in the same transaction.
        function bridgeClaim(string calldata solution, bytes32 secret, uint256 till, uint8 v, bytes32 r, bytes32 s, UserRequest calldata userRequest, address bridgeImpl) external;

        /// In-protocol balance of `account`.
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Bindings for the extended forwarder.
///
/// The request carries the target chain id and a validity deadline; the
/// EIP-712 domain is `{name: "SednForwarder", version, verifyingContract}`.
pub mod sedn_forwarder {
    use serde::{Deserialize, Serialize};

    alloy::sol! {
        /// The extended eight-field forward request.
        #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
        struct ForwardRequest {
            address from;
            address to;
            uint256 chainid;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            uint256 valid;
            bytes data;
        }

        #[sol(rpc)]
        #[derive(Debug)]
        interface ISednForwarder {
            function getNonce(address from) external view returns (uint256);
            function verify(ForwardRequest calldata req, bytes calldata signature) external view returns (bool);
            function execute(ForwardRequest calldata req, bytes calldata signature) external payable returns (bool, bytes memory);
        }
    }
}

/// Bindings for the legacy minimal forwarder.
///
/// Six-field request, EIP-712 domain `{name: "MinimalForwarder", version
/// "0.0.1", chainId, verifyingContract}`. Both schemas exist in the wild; a
/// request hashed under the wrong one recovers to the wrong signer, so the
/// schema is resolved from the forwarder deployment, never inferred.
pub mod minimal_forwarder {
    use serde::{Deserialize, Serialize};

    alloy::sol! {
        /// The legacy six-field forward request.
        #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
        struct ForwardRequest {
            address from;
            address to;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            bytes data;
        }

        #[sol(rpc)]
        #[derive(Debug)]
        interface IMinimalForwarder {
            function getNonce(address from) external view returns (uint256);
            function verify(ForwardRequest calldata req, bytes calldata signature) external view returns (bool);
            function execute(ForwardRequest calldata req, bytes calldata signature) external payable returns (bool, bytes memory);
        }
    }
}
