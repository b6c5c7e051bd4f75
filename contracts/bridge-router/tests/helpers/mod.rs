//! Shared multi-test environment for the router integration tests.
//!
//! Deploys a CW20 token (router as minter), a supply oracle and the router,
//! then registers one transport of every kind with a route to `REMOTE_CHAIN`.

#![allow(dead_code)]

use cosmwasm_std::{coins, from_json, Addr, Binary, Coin, Empty, HexBinary, Uint128};
use cw20::{
    BalanceResponse, Cw20Coin, Cw20ExecuteMsg, Cw20QueryMsg, MinterResponse, TokenInfoResponse,
};
use cw_multi_test::{App, AppResponse, Contract, ContractWrapper, Executor};
use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use bridge_router::msg::{
    BridgeReceipt, ExecuteMsg, InstantiateMsg, Packet, PacketData, QueryMsg,
};
use bridge_router::TransportKind;

pub const THIS_CHAIN: u64 = 1;
pub const REMOTE_CHAIN: u64 = 56;
pub const FEE_DENOM: &str = "uluna";

pub const ENDPOINT: &str = "endpoint";
pub const GATEWAY: &str = "gateway";
pub const ESCROW: &str = "escrow";
pub const QUORUM: &str = "quorum";

/// Trusted remote senders per route
pub const ENDPOINT_SENDER: [u8; 32] = [0xE1; 32];
pub const GATEWAY_SENDER: [u8; 32] = [0x6A; 32];
pub const QUORUM_SENDER: [u8; 32] = [0x9B; 32];

pub const VALIDATORS: u8 = 21;
pub const THRESHOLD: u32 = 14;
pub const PACKET_TIMEOUT: u64 = 3_600;

pub const USER_TOKENS: u128 = 10_000_000;
pub const USER_ULUNA: u128 = 10_000_000_000;

pub struct TestEnv {
    pub app: App,
    pub router: Addr,
    pub token: Addr,
    pub oracle: Addr,
    pub admin: Addr,
    pub relayer: Addr,
    pub user: Addr,
    pub fee_collector: Addr,
    pub reporter1: Addr,
    pub reporter2: Addr,
    pub validators: Vec<SigningKey>,
    pub attester: SigningKey,
}

// ============================================================================
// Contracts
// ============================================================================

fn contract_router() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        bridge_router::contract::execute,
        bridge_router::contract::instantiate,
        bridge_router::contract::query,
    );
    Box::new(contract)
}

fn contract_cw20() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        cw20_base::contract::execute,
        cw20_base::contract::instantiate,
        cw20_base::contract::query,
    );
    Box::new(contract)
}

fn contract_oracle() -> Box<dyn Contract<Empty>> {
    let contract = ContractWrapper::new(
        supply_oracle::contract::execute,
        supply_oracle::contract::instantiate,
        supply_oracle::contract::query,
    );
    Box::new(contract)
}

// ============================================================================
// Setup
// ============================================================================

pub fn setup() -> TestEnv {
    let mut app = App::default();
    let admin = Addr::unchecked("terra1admin");
    let relayer = Addr::unchecked("terra1relayer");
    let user = Addr::unchecked("terra1user");
    let fee_collector = Addr::unchecked("terra1feecollector");
    let reporter1 = Addr::unchecked("terra1reporter1");
    let reporter2 = Addr::unchecked("terra1reporter2");

    app.init_modules(|router, _, storage| {
        router
            .bank
            .init_balance(storage, &user, coins(USER_ULUNA, FEE_DENOM))
            .unwrap();
    });

    // Token, minted by admin until the router takes over
    let cw20_id = app.store_code(contract_cw20());
    let token = app
        .instantiate_contract(
            cw20_id,
            admin.clone(),
            &cw20_base::msg::InstantiateMsg {
                name: "Omnichain Dollar".to_string(),
                symbol: "OUSD".to_string(),
                decimals: 6,
                initial_balances: vec![Cw20Coin {
                    address: user.to_string(),
                    amount: Uint128::new(USER_TOKENS),
                }],
                mint: Some(MinterResponse {
                    minter: admin.to_string(),
                    cap: None,
                }),
                marketing: None,
            },
            &[],
            "ousd",
            None,
        )
        .unwrap();

    let oracle_id = app.store_code(contract_oracle());
    let oracle = app
        .instantiate_contract(
            oracle_id,
            admin.clone(),
            &supply_oracle::msg::InstantiateMsg {
                admin: admin.to_string(),
                reporters: vec![reporter1.to_string(), reporter2.to_string()],
                required_signatures: Some(2),
                tolerance_bps: Some(100),
                reconciliation_period: Some(3_600),
                expected_total_supply: Uint128::zero(),
                chains: vec![THIS_CHAIN, REMOTE_CHAIN],
            },
            &[],
            "supply-oracle",
            None,
        )
        .unwrap();

    let router_id = app.store_code(contract_router());
    let router = app
        .instantiate_contract(
            router_id,
            admin.clone(),
            &InstantiateMsg {
                admin: admin.to_string(),
                this_chain_id: THIS_CHAIN,
                token: token.to_string(),
                fee_denom: FEE_DENOM.to_string(),
                fee_collector: fee_collector.to_string(),
                supply_oracle: Some(oracle.to_string()),
                min_bridge_amount: Uint128::new(1_000),
                max_bridge_amount: Uint128::new(5_000_000),
                min_validators: None,
            },
            &[],
            "bridge-router",
            Some(admin.to_string()),
        )
        .unwrap();

    app.execute_contract(
        admin.clone(),
        token.clone(),
        &Cw20ExecuteMsg::UpdateMinter {
            new_minter: Some(router.to_string()),
        },
        &[],
    )
    .unwrap();

    let validators: Vec<SigningKey> = (0..VALIDATORS).map(key).collect();
    let attester = SigningKey::from_slice(&[0xA7; 32]).unwrap();

    let mut env = TestEnv {
        app,
        router,
        token,
        oracle,
        admin,
        relayer,
        user,
        fee_collector,
        reporter1,
        reporter2,
        validators,
        attester,
    };

    let attester_key = Binary::from(env.attester.verifying_key().to_sec1_bytes().to_vec());
    let transports = [
        (
            ENDPOINT,
            TransportKind::EndpointRelay,
            Binary::from(ENDPOINT_SENDER.to_vec()),
        ),
        (
            GATEWAY,
            TransportKind::GatewayCommitment,
            Binary::from(GATEWAY_SENDER.to_vec()),
        ),
        (ESCROW, TransportKind::AttestedEscrow, attester_key),
        (
            QUORUM,
            TransportKind::ValidatorQuorum,
            Binary::from(QUORUM_SENDER.to_vec()),
        ),
    ];
    let relayer = env.relayer.to_string();
    for (transport_id, kind, trusted_sender) in transports {
        let packet_timeout_seconds = match kind {
            TransportKind::ValidatorQuorum => Some(PACKET_TIMEOUT),
            _ => None,
        };
        admin_exec(
            &mut env,
            &ExecuteMsg::RegisterTransport {
                transport_id: transport_id.to_string(),
                kind,
                relayer: relayer.clone(),
                packet_timeout_seconds,
            },
        )
        .unwrap();
        admin_exec(
            &mut env,
            &ExecuteMsg::SetRoute {
                transport_id: transport_id.to_string(),
                chain_id: REMOTE_CHAIN,
                trusted_sender,
                enabled: true,
            },
        )
        .unwrap();
    }

    let addresses: Vec<HexBinary> = env.validators.iter().map(eth_address).collect();
    admin_exec(
        &mut env,
        &ExecuteMsg::SetValidatorSet {
            transport_id: QUORUM.to_string(),
            validators: addresses,
            threshold: THRESHOLD,
        },
    )
    .unwrap();

    env
}

// ============================================================================
// Execution Helpers
// ============================================================================

pub fn admin_exec(env: &mut TestEnv, msg: &ExecuteMsg) -> Result<AppResponse, String> {
    env.app
        .execute_contract(env.admin.clone(), env.router.clone(), msg, &[])
        .map_err(|err| err.root_cause().to_string())
}

pub fn exec_as(
    env: &mut TestEnv,
    sender: &Addr,
    msg: &ExecuteMsg,
    funds: &[Coin],
) -> Result<AppResponse, String> {
    env.app
        .execute_contract(sender.clone(), env.router.clone(), msg, funds)
        .map_err(|err| err.root_cause().to_string())
}

/// Approve the router for `amount` and bridge it from the user.
pub fn bridge(
    env: &mut TestEnv,
    transport_id: &str,
    amount: u128,
    fee: u128,
) -> Result<AppResponse, String> {
    env.app
        .execute_contract(
            env.user.clone(),
            env.token.clone(),
            &Cw20ExecuteMsg::IncreaseAllowance {
                spender: env.router.to_string(),
                amount: Uint128::new(amount),
                expires: None,
            },
            &[],
        )
        .unwrap();

    let funds = if fee == 0 {
        vec![]
    } else {
        coins(fee, FEE_DENOM)
    };
    let user = env.user.clone();
    exec_as(
        env,
        &user,
        &ExecuteMsg::Bridge {
            transport_id: transport_id.to_string(),
            dest_chain: REMOTE_CHAIN,
            recipient: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
            amount: Uint128::new(amount),
            extra_data: None,
        },
        &funds,
    )
}

pub fn receipt(res: &AppResponse) -> BridgeReceipt {
    from_json(res.data.as_ref().expect("bridge sets response data")).unwrap()
}

/// Relayer delivery from `REMOTE_CHAIN`.
pub fn deliver(
    env: &mut TestEnv,
    transport_id: &str,
    proof: &[u8],
    recipient: &str,
    amount: u128,
    transfer_id: [u8; 32],
) -> Result<AppResponse, String> {
    let relayer = env.relayer.clone();
    exec_as(
        env,
        &relayer,
        &ExecuteMsg::DeliverTransfer {
            transport_id: transport_id.to_string(),
            source_chain: REMOTE_CHAIN,
            sender_proof: Binary::from(proof.to_vec()),
            recipient: recipient.to_string(),
            amount: Uint128::new(amount),
            transfer_id: Binary::from(transfer_id.to_vec()),
        },
        &[],
    )
}

// ============================================================================
// Query Helpers
// ============================================================================

pub fn query<T: serde::de::DeserializeOwned>(env: &TestEnv, msg: &QueryMsg) -> T {
    env.app.wrap().query_wasm_smart(&env.router, msg).unwrap()
}

pub fn token_balance(env: &TestEnv, address: &Addr) -> u128 {
    let res: BalanceResponse = env
        .app
        .wrap()
        .query_wasm_smart(
            &env.token,
            &Cw20QueryMsg::Balance {
                address: address.to_string(),
            },
        )
        .unwrap();
    res.balance.u128()
}

pub fn total_supply(env: &TestEnv) -> u128 {
    let res: TokenInfoResponse = env
        .app
        .wrap()
        .query_wasm_smart(&env.token, &Cw20QueryMsg::TokenInfo {})
        .unwrap();
    res.total_supply.u128()
}

pub fn native_balance(env: &TestEnv, address: &Addr) -> u128 {
    env.app
        .wrap()
        .query_balance(address, FEE_DENOM)
        .unwrap()
        .amount
        .u128()
}

pub fn attr(res: &AppResponse, key: &str) -> Option<String> {
    res.events
        .iter()
        .flat_map(|e| &e.attributes)
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
}

pub fn count_events(res: &AppResponse, ty: &str) -> usize {
    let wasm_ty = format!("wasm-{}", ty);
    res.events.iter().filter(|e| e.ty == wasm_ty).count()
}

pub fn advance(env: &mut TestEnv, seconds: u64) {
    env.app.update_block(|block| {
        block.time = block.time.plus_seconds(seconds);
        block.height += seconds / 5;
    });
}

pub fn now(env: &TestEnv) -> u64 {
    env.app.block_info().time.seconds()
}

// ============================================================================
// Signing Helpers
// ============================================================================

pub fn key(i: u8) -> SigningKey {
    SigningKey::from_slice(&[i + 1; 32]).unwrap()
}

pub fn eth_address(sk: &SigningKey) -> HexBinary {
    let point = VerifyingKey::from(sk).to_encoded_point(false);
    let hash = common::keccak256(&point.as_bytes()[1..]);
    HexBinary::from(hash[12..].to_vec())
}

/// 65-byte `r || s || v` signature over the EIP-191 hash of `digest`.
pub fn sign_eth(sk: &SigningKey, digest: &[u8; 32]) -> Binary {
    let (sig, recid) = sk
        .sign_prehash_recoverable(&common::eip191_hash(digest))
        .unwrap();
    let mut bytes = sig.to_bytes().to_vec();
    bytes.push(recid.to_byte() + 27);
    Binary::from(bytes)
}

/// Signatures of the first `count` validators.
pub fn quorum_signatures(env: &TestEnv, digest: &[u8; 32], count: usize) -> Vec<Binary> {
    env.validators
        .iter()
        .take(count)
        .map(|sk| sign_eth(sk, digest))
        .collect()
}

/// 64-byte attester signature releasing escrow.
pub fn sign_escrow_release(
    env: &TestEnv,
    transfer_id: &[u8; 32],
    recipient: &str,
    amount: u128,
) -> Vec<u8> {
    let digest = bridge_router::hash::compute_escrow_digest(
        REMOTE_CHAIN,
        transfer_id,
        recipient,
        amount,
    );
    let (sig, _) = env
        .attester
        .sign_prehash_recoverable(&common::eip191_hash(&digest))
        .unwrap();
    sig.to_bytes().to_vec()
}

/// Inbound packet from `REMOTE_CHAIN`'s router.
pub fn inbound_packet(
    sequence: u64,
    transfer_id: [u8; 32],
    recipient: &str,
    amount: u128,
    timeout_timestamp: u64,
) -> Packet {
    Packet {
        sequence,
        source_chain: REMOTE_CHAIN,
        dest_chain: THIS_CHAIN,
        sender: Binary::from(QUORUM_SENDER.to_vec()),
        timeout_timestamp,
        data: PacketData {
            transfer_id: Binary::from(transfer_id.to_vec()),
            recipient: recipient.to_string(),
            amount: Uint128::new(amount),
        },
    }
}
