//! Real estate valuation contract ABI
//!
//! Uses alloy's sol! macro to generate type-safe bindings. Function and event
//! names must stay bit-exact with the deployed contract.

use alloy::sol;

sol! {
    /// Oracle-backed valuation contract (SmartZip + ProspectNow, averaged on-chain)
    #[sol(rpc)]
    contract RealEstateValuation {
        // ========================================================================
        // Oracle Requests
        // ========================================================================

        /// Request a SmartZip valuation for a ZIP code
        function requestSmartZipValue(string calldata zipCode) external;

        /// Request a ProspectNow valuation for a ZIP code
        function requestProspectNowValue(string calldata zipCode) external;

        /// Withdraw the remaining LINK balance to the owner
        function withdrawLink() external;

        // ========================================================================
        // View Functions
        // ========================================================================

        function smartZipValue() external view returns (uint256);

        function prospectNowValue() external view returns (uint256);

        function averageValue() external view returns (uint256);

        // ========================================================================
        // Events
        // ========================================================================

        event SmartZipValueUpdated(uint256 value);

        event ProspectNowValueUpdated(uint256 value);

        event AverageValueUpdated(uint256 value);
    }
}
