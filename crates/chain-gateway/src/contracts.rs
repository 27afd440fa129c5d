//! Bindings of the deployed governance contracts, only the parts the
//! relayer touches.

#![allow(clippy::too_many_arguments)]

use ethers::contract::abigen;

abigen!(
    GovernorContract,
    r#"[
        struct ProposalWithoutVotes { uint256 id; address creator; address executor; address[] targets; uint256[] values; string[] signatures; bytes[] calldatas; bool[] withDelegatecalls; uint256 startBlock; uint256 endBlock; uint256 executionTime; uint256 forVotes; uint256 againstVotes; bool executed; bool canceled; address strategy; bytes32 ipfsHash; }
        struct Vote { bool support; uint248 votingPower; }
        function getProposalsCount() external view returns (uint256)
        function getProposalById(uint256 proposalId) external view returns (ProposalWithoutVotes memory)
        function getProposalState(uint256 proposalId) external view returns (uint8)
        function getVoteOnProposal(uint256 proposalId, address voter) external view returns (Vote memory)
        function submitVoteBySignature(uint256 proposalId, bool support, uint8 v, bytes32 r, bytes32 s) external
    ]"#
);

abigen!(
    GovernanceTokenContract,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function getDelegateeByType(address delegator, uint8 delegationType) external view returns (address)
        function nonces(address owner) external view returns (uint256)
        function delegateBySig(address delegatee, uint256 nonce, uint256 expiry, uint8 v, bytes32 r, bytes32 s) external
    ]"#
);

abigen!(
    GovernanceStrategyContract,
    r#"[
        function getVotingPowerAt(address user, uint256 blockNumber) external view returns (uint256)
    ]"#
);

abigen!(
    MulticallContract,
    r#"[
        struct Call { address target; bytes callData; }
        function aggregate(Call[] calls) external returns (uint256 blockNumber, bytes[] returnData)
    ]"#
);
