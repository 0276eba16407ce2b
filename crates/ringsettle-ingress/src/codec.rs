//! Compact binary wire format for submissions.
//!
//! ## Layout (big-endian)
//!
//! ```text
//! u16  format version
//! u8   header flags        bit0 fee_recipient, bit1 miner, bit2 mining sig
//! [20] fee_recipient       if flagged
//! [20] miner               if flagged
//! sig  mining signature    if flagged
//! u16  order count
//!      per order:
//!        u32  field mask   which optional fields follow
//!        [20] owner, [20] token_s, [20] token_b
//!        amt  amount_s, amt amount_b
//!        u64  valid_since
//!        ...  optional fields present in the mask, in bit order
//! u16  ring count
//!      per ring: u8 size, size × u16 order index
//!
//! amt = u8 length (0..=32) || minimal big-endian bytes
//! sig = u8 algorithm || [32] public key || u8 length || bytes
//! ```
//!
//! Fields holding their protocol default are left out: a recipient equal to
//! the owner, a fee token equal to the protocol base token, zero amounts and
//! percentages, fungible token types, default tranches, empty transfer data,
//! absent signatures and false flags. The decoder restores them, so the base
//! token never travels on the wire and `decode(encode(s)) == s`.

use ringsettle_types::constants::{
    MAX_AMOUNT_BYTES, MAX_ORDERS_PER_SUBMISSION, MAX_RINGS_PER_SUBMISSION, MAX_TRANSFER_DATA_BYTES,
    WIRE_FORMAT_VERSION,
};
use ringsettle_types::{
    Address, Amount, Order, Result, Ring, RingsettleError, SignAlgorithm, Signature, Submission,
    TokenType, Tranche,
};

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

const HEADER_FEE_RECIPIENT: u8 = 1 << 0;
const HEADER_MINER: u8 = 1 << 1;
const HEADER_SIG: u8 = 1 << 2;
const HEADER_KNOWN: u8 = HEADER_FEE_RECIPIENT | HEADER_MINER | HEADER_SIG;

mod field {
    pub const VERSION: u32 = 1 << 0;
    pub const VALID_UNTIL: u32 = 1 << 1;
    pub const BROKER: u32 = 1 << 2;
    pub const DUAL_AUTH_ADDR: u32 = 1 << 3;
    pub const WALLET_ADDR: u32 = 1 << 4;
    pub const WALLET_SPLIT: u32 = 1 << 5;
    pub const TOKEN_RECIPIENT: u32 = 1 << 6;
    pub const FEE_TOKEN: u32 = 1 << 7;
    pub const FEE_AMOUNT: u32 = 1 << 8;
    pub const WAIVE_FEE: u32 = 1 << 9;
    pub const TOKEN_S_FEE: u32 = 1 << 10;
    pub const TOKEN_B_FEE: u32 = 1 << 11;
    pub const ALL_OR_NONE: u32 = 1 << 12;
    pub const TOKEN_TYPE_S: u32 = 1 << 13;
    pub const TOKEN_TYPE_B: u32 = 1 << 14;
    pub const TOKEN_TYPE_FEE: u32 = 1 << 15;
    pub const TRANCHE_S: u32 = 1 << 16;
    pub const TRANCHE_B: u32 = 1 << 17;
    pub const TRANSFER_DATA_S: u32 = 1 << 18;
    pub const SIG: u32 = 1 << 19;
    pub const DUAL_AUTH_SIG: u32 = 1 << 20;
    pub const ON_CHAIN: u32 = 1 << 21;

    pub const KNOWN: u32 = (1 << 22) - 1;
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Encodes and decodes submissions for one protocol deployment.
#[derive(Debug, Clone, Copy)]
pub struct WireCodec {
    /// Default fee token, omitted from the wire.
    base_token: Address,
}

impl WireCodec {
    #[must_use]
    pub fn new(base_token: Address) -> Self {
        Self { base_token }
    }

    pub fn encode(&self, submission: &Submission) -> Result<Vec<u8>> {
        let mut w = WireWriter::default();
        w.u16(WIRE_FORMAT_VERSION);

        let mut flags = 0u8;
        if submission.fee_recipient.is_some() {
            flags |= HEADER_FEE_RECIPIENT;
        }
        if submission.miner.is_some() {
            flags |= HEADER_MINER;
        }
        if submission.sig.is_some() {
            flags |= HEADER_SIG;
        }
        w.u8(flags);
        if let Some(fee_recipient) = &submission.fee_recipient {
            w.address(fee_recipient);
        }
        if let Some(miner) = &submission.miner {
            w.address(miner);
        }
        if let Some(sig) = &submission.sig {
            w.signature(sig)?;
        }

        w.u16(count_u16(submission.orders.len(), MAX_ORDERS_PER_SUBMISSION, "orders")?);
        for order in &submission.orders {
            self.encode_order(&mut w, order)?;
        }

        w.u16(count_u16(submission.rings.len(), MAX_RINGS_PER_SUBMISSION, "rings")?);
        for ring in &submission.rings {
            let size = u8::try_from(ring.len()).map_err(|_| RingsettleError::InvalidEncoding {
                reason: format!("ring of {} orders does not fit the wire format", ring.len()),
            })?;
            w.u8(size);
            for &index in &ring.orders {
                w.u16(count_u16(index, usize::from(u16::MAX), "order index")?);
            }
        }
        Ok(w.finish())
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Submission> {
        let mut r = WireReader::new(bytes);
        let version = r.u16()?;
        if version != WIRE_FORMAT_VERSION {
            return Err(RingsettleError::UnsupportedVersion(version));
        }
        let flags = r.u8()?;
        if flags & !HEADER_KNOWN != 0 {
            return Err(RingsettleError::InvalidEncoding {
                reason: format!("unknown header flags {flags:#04x}"),
            });
        }
        let fee_recipient = if flags & HEADER_FEE_RECIPIENT != 0 {
            Some(r.address()?)
        } else {
            None
        };
        let miner = if flags & HEADER_MINER != 0 {
            Some(r.address()?)
        } else {
            None
        };
        let sig = if flags & HEADER_SIG != 0 {
            Some(r.signature()?)
        } else {
            None
        };

        let order_count = usize::from(r.u16()?);
        let mut orders = Vec::with_capacity(order_count);
        for _ in 0..order_count {
            orders.push(self.decode_order(&mut r)?);
        }

        let ring_count = usize::from(r.u16()?);
        let mut rings = Vec::with_capacity(ring_count);
        for _ in 0..ring_count {
            let size = usize::from(r.u8()?);
            let mut indices = Vec::with_capacity(size);
            for _ in 0..size {
                indices.push(usize::from(r.u16()?));
            }
            rings.push(Ring::new(indices));
        }
        r.finish()?;

        Ok(Submission {
            fee_recipient,
            miner,
            sig,
            orders,
            rings,
        })
    }

    fn encode_order(&self, w: &mut WireWriter, order: &Order) -> Result<()> {
        let mut mask = 0u32;
        let mut set = |bit: u32, present: bool| {
            if present {
                mask |= bit;
            }
        };
        set(field::VERSION, order.version != 0);
        set(field::VALID_UNTIL, order.valid_until != 0);
        set(field::BROKER, order.broker.is_some());
        set(field::DUAL_AUTH_ADDR, order.dual_auth_addr.is_some());
        set(field::WALLET_ADDR, order.wallet_addr.is_some());
        set(field::WALLET_SPLIT, order.wallet_split_percentage != 0);
        set(field::TOKEN_RECIPIENT, order.token_recipient != order.owner);
        set(field::FEE_TOKEN, order.fee_token != self.base_token);
        set(field::FEE_AMOUNT, !order.fee_amount.is_zero());
        set(field::WAIVE_FEE, order.waive_fee_percentage != 0);
        set(field::TOKEN_S_FEE, order.token_s_fee_percentage != 0);
        set(field::TOKEN_B_FEE, order.token_b_fee_percentage != 0);
        set(field::ALL_OR_NONE, order.all_or_none);
        set(field::TOKEN_TYPE_S, order.token_type_s != TokenType::Fungible);
        set(field::TOKEN_TYPE_B, order.token_type_b != TokenType::Fungible);
        set(field::TOKEN_TYPE_FEE, order.token_type_fee != TokenType::Fungible);
        set(field::TRANCHE_S, !order.tranche_s.is_default());
        set(field::TRANCHE_B, !order.tranche_b.is_default());
        set(field::TRANSFER_DATA_S, !order.transfer_data_s.is_empty());
        set(field::SIG, order.sig.is_some());
        set(field::DUAL_AUTH_SIG, order.dual_auth_sig.is_some());
        set(field::ON_CHAIN, order.on_chain);

        w.u32(mask);
        w.address(&order.owner);
        w.address(&order.token_s);
        w.address(&order.token_b);
        w.amount(order.amount_s);
        w.amount(order.amount_b);
        w.u64(order.valid_since);

        if mask & field::VERSION != 0 {
            w.u32(order.version);
        }
        if mask & field::VALID_UNTIL != 0 {
            w.u64(order.valid_until);
        }
        for (bit, address) in [
            (field::BROKER, &order.broker),
            (field::DUAL_AUTH_ADDR, &order.dual_auth_addr),
            (field::WALLET_ADDR, &order.wallet_addr),
        ] {
            if let (true, Some(address)) = (mask & bit != 0, address) {
                w.address(address);
            }
        }
        if mask & field::WALLET_SPLIT != 0 {
            w.u8(order.wallet_split_percentage);
        }
        if mask & field::TOKEN_RECIPIENT != 0 {
            w.address(&order.token_recipient);
        }
        if mask & field::FEE_TOKEN != 0 {
            w.address(&order.fee_token);
        }
        if mask & field::FEE_AMOUNT != 0 {
            w.amount(order.fee_amount);
        }
        for (bit, value) in [
            (field::WAIVE_FEE, order.waive_fee_percentage),
            (field::TOKEN_S_FEE, order.token_s_fee_percentage),
            (field::TOKEN_B_FEE, order.token_b_fee_percentage),
        ] {
            if mask & bit != 0 {
                w.u16(value);
            }
        }
        for (bit, token_type) in [
            (field::TOKEN_TYPE_S, order.token_type_s),
            (field::TOKEN_TYPE_B, order.token_type_b),
            (field::TOKEN_TYPE_FEE, order.token_type_fee),
        ] {
            if mask & bit != 0 {
                w.u8(token_type.code());
            }
        }
        if mask & field::TRANCHE_S != 0 {
            w.bytes32(order.tranche_s.as_bytes());
        }
        if mask & field::TRANCHE_B != 0 {
            w.bytes32(order.tranche_b.as_bytes());
        }
        if mask & field::TRANSFER_DATA_S != 0 {
            w.data(&order.transfer_data_s)?;
        }
        if let Some(sig) = &order.sig {
            w.signature(sig)?;
        }
        if let Some(sig) = &order.dual_auth_sig {
            w.signature(sig)?;
        }
        Ok(())
    }

    fn decode_order(&self, r: &mut WireReader<'_>) -> Result<Order> {
        let mask = r.u32()?;
        if mask & !field::KNOWN != 0 {
            return Err(RingsettleError::InvalidEncoding {
                reason: format!("unknown order field mask bits {mask:#010x}"),
            });
        }
        let owner = r.address()?;
        let token_s = r.address()?;
        let token_b = r.address()?;
        let amount_s = r.amount()?;
        let amount_b = r.amount()?;
        let mut order = Order::new(owner, token_s, token_b, amount_s, amount_b, self.base_token);
        order.valid_since = r.u64()?;

        if mask & field::VERSION != 0 {
            order.version = r.u32()?;
        }
        if mask & field::VALID_UNTIL != 0 {
            order.valid_until = r.u64()?;
        }
        if mask & field::BROKER != 0 {
            order.broker = Some(r.address()?);
        }
        if mask & field::DUAL_AUTH_ADDR != 0 {
            order.dual_auth_addr = Some(r.address()?);
        }
        if mask & field::WALLET_ADDR != 0 {
            order.wallet_addr = Some(r.address()?);
        }
        if mask & field::WALLET_SPLIT != 0 {
            order.wallet_split_percentage = r.u8()?;
        }
        if mask & field::TOKEN_RECIPIENT != 0 {
            order.token_recipient = r.address()?;
        }
        if mask & field::FEE_TOKEN != 0 {
            order.fee_token = r.address()?;
        }
        if mask & field::FEE_AMOUNT != 0 {
            order.fee_amount = r.amount()?;
        }
        if mask & field::WAIVE_FEE != 0 {
            order.waive_fee_percentage = r.u16()?;
        }
        if mask & field::TOKEN_S_FEE != 0 {
            order.token_s_fee_percentage = r.u16()?;
        }
        if mask & field::TOKEN_B_FEE != 0 {
            order.token_b_fee_percentage = r.u16()?;
        }
        order.all_or_none = mask & field::ALL_OR_NONE != 0;
        if mask & field::TOKEN_TYPE_S != 0 {
            order.token_type_s = r.token_type()?;
        }
        if mask & field::TOKEN_TYPE_B != 0 {
            order.token_type_b = r.token_type()?;
        }
        if mask & field::TOKEN_TYPE_FEE != 0 {
            order.token_type_fee = r.token_type()?;
        }
        if mask & field::TRANCHE_S != 0 {
            order.tranche_s = Tranche::from_bytes(r.bytes32()?);
        }
        if mask & field::TRANCHE_B != 0 {
            order.tranche_b = Tranche::from_bytes(r.bytes32()?);
        }
        if mask & field::TRANSFER_DATA_S != 0 {
            order.transfer_data_s = r.data()?;
        }
        if mask & field::SIG != 0 {
            order.sig = Some(r.signature()?);
        }
        if mask & field::DUAL_AUTH_SIG != 0 {
            order.dual_auth_sig = Some(r.signature()?);
        }
        order.on_chain = mask & field::ON_CHAIN != 0;
        Ok(order)
    }
}

fn count_u16(count: usize, limit: usize, what: &str) -> Result<u16> {
    if count > limit {
        return Err(RingsettleError::InvalidEncoding {
            reason: format!("{count} {what} exceed the wire limit of {limit}"),
        });
    }
    u16::try_from(count).map_err(|_| RingsettleError::InvalidEncoding {
        reason: format!("{count} {what} do not fit in 16 bits"),
    })
}

// ---------------------------------------------------------------------------
// Primitive writer / reader
// ---------------------------------------------------------------------------

#[derive(Default)]
struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn address(&mut self, address: &Address) {
        self.buf.extend_from_slice(address.as_slice());
    }

    fn bytes32(&mut self, bytes: &[u8; 32]) {
        self.buf.extend_from_slice(bytes);
    }

    fn amount(&mut self, amount: Amount) {
        let bytes = amount.to_be_bytes::<32>();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let minimal = &bytes[start..];
        // At most 32 bytes, so the length always fits.
        self.u8(u8::try_from(minimal.len()).unwrap_or(32));
        self.buf.extend_from_slice(minimal);
    }

    fn data(&mut self, data: &[u8]) -> Result<()> {
        let len = count_u16(data.len(), MAX_TRANSFER_DATA_BYTES, "transfer data bytes")?;
        self.u16(len);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    fn signature(&mut self, sig: &Signature) -> Result<()> {
        let len = u8::try_from(sig.bytes.len()).map_err(|_| RingsettleError::InvalidEncoding {
            reason: format!("signature of {} bytes does not fit", sig.bytes.len()),
        })?;
        self.u8(sig.algorithm.code());
        self.bytes32(&sig.public_key);
        self.u8(len);
        self.buf.extend_from_slice(&sig.bytes);
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }
}

struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(needed)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(RingsettleError::TruncatedInput {
                offset: self.offset,
                needed,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn address(&mut self) -> Result<Address> {
        Ok(Address::from(self.array::<20>()?))
    }

    fn bytes32(&mut self) -> Result<[u8; 32]> {
        self.array()
    }

    fn amount(&mut self) -> Result<Amount> {
        let len = usize::from(self.u8()?);
        if len > MAX_AMOUNT_BYTES {
            return Err(RingsettleError::InvalidEncoding {
                reason: format!("amount of {len} bytes exceeds {MAX_AMOUNT_BYTES}"),
            });
        }
        let bytes = self.take(len)?;
        Amount::try_from_be_slice(bytes).ok_or_else(|| RingsettleError::InvalidEncoding {
            reason: "amount out of range".into(),
        })
    }

    fn data(&mut self) -> Result<Vec<u8>> {
        let len = usize::from(self.u16()?);
        Ok(self.take(len)?.to_vec())
    }

    fn token_type(&mut self) -> Result<TokenType> {
        let code = self.u8()?;
        TokenType::from_code(code).ok_or(RingsettleError::UnknownTokenType(code))
    }

    fn signature(&mut self) -> Result<Signature> {
        let code = self.u8()?;
        let algorithm =
            SignAlgorithm::from_code(code).ok_or(RingsettleError::UnknownSignAlgorithm(code))?;
        let public_key = self.bytes32()?;
        let len = usize::from(self.u8()?);
        let bytes = self.take(len)?.to_vec();
        Ok(Signature {
            algorithm,
            public_key,
            bytes,
        })
    }

    fn finish(self) -> Result<()> {
        let trailing = self.bytes.len() - self.offset;
        if trailing == 0 {
            Ok(())
        } else {
            Err(RingsettleError::InvalidEncoding {
                reason: format!("{trailing} trailing bytes"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use ringsettle_types::TestAccount;

    use super::*;
    use crate::test_support::token;

    const BASE: u8 = 0x1c;

    fn codec() -> WireCodec {
        WireCodec::new(token(BASE))
    }

    fn plain_order(owner: u8, token_s: u8, token_b: u8) -> Order {
        Order::new(
            token(owner),
            token(token_s),
            token(token_b),
            Amount::from(100u64) * Amount::from(1_000_000_000_000_000_000u64),
            Amount::from(10u64) * Amount::from(1_000_000_000_000_000_000u64),
            token(BASE),
        )
    }

    fn rich_order() -> Order {
        let owner = TestAccount::from_seed(1);
        let dual = TestAccount::from_seed(2);
        let mut order = plain_order(0, 3, 4);
        order.owner = owner.address;
        order.token_recipient = token(0x44);
        order.version = 2;
        order.valid_since = 1_600_000_000;
        order.valid_until = 1_800_000_000;
        order.broker = Some(token(0xbb));
        order.dual_auth_addr = Some(dual.address);
        order.wallet_addr = Some(token(0x33));
        order.wallet_split_percentage = 25;
        order.fee_token = token(0x55);
        order.fee_amount = Amount::from(7u64);
        order.all_or_none = true;
        order.token_type_s = TokenType::Partitioned;
        order.token_type_b = TokenType::Partitioned;
        order.tranche_s = Tranche::from_bytes([9; 32]);
        order.tranche_b = Tranche::from_bytes([8; 32]);
        order.transfer_data_s = vec![1, 2, 3];
        order.dual_auth_sig = Some(dual.sign(SignAlgorithm::Ethereum, &[1; 32]));
        order.signed_by(&owner, SignAlgorithm::Eip712)
    }

    #[test]
    fn roundtrip_preserves_every_field_and_hash() {
        let miner = TestAccount::from_seed(7);
        let mut p2p = plain_order(0xa1, 4, 3);
        p2p.waive_fee_percentage = 1;
        p2p.token_s_fee_percentage = 20;
        p2p.token_b_fee_percentage = 30;
        p2p.on_chain = true;
        let submission = Submission {
            fee_recipient: Some(token(0x66)),
            ..Submission::new(vec![rich_order(), p2p], vec![Ring::new(vec![0, 1])])
        }
        .mined_by(&miner, SignAlgorithm::Ethereum, token(0x0f));

        let bytes = codec().encode(&submission).unwrap();
        let decoded = codec().decode(&bytes).unwrap();
        assert_eq!(decoded, submission);
        assert_eq!(decoded.order_hashes(), submission.order_hashes());
    }

    #[test]
    fn defaults_are_omitted() {
        let submission = Submission::new(
            vec![plain_order(0xa0, 1, 2), plain_order(0xa1, 2, 1)],
            vec![Ring::new(vec![0, 1])],
        );
        let bytes = codec().encode(&submission).unwrap();
        let base = token(BASE);
        assert!(
            !bytes.windows(20).any(|window| window == base.as_slice()),
            "base token must not be on the wire"
        );
        // version + flags + count + 2 × (mask + 3 addresses + 2 amounts + valid_since) + rings
        let per_order = 4 + 60 + (1 + 9) + (1 + 8) + 8;
        assert_eq!(bytes.len(), 2 + 1 + 2 + 2 * per_order + 2 + 1 + 4);
    }

    #[test]
    fn explicit_base_fee_token_decodes_to_same_order() {
        let order = plain_order(0xa0, 1, 2);
        let submission = Submission::new(vec![order.clone()], Vec::new());
        let decoded = codec().decode(&codec().encode(&submission).unwrap()).unwrap();
        assert_eq!(decoded.orders[0].fee_token, token(BASE));
        assert_eq!(decoded.orders[0].token_recipient, order.owner);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let submission = Submission::new(vec![plain_order(0xa0, 1, 2)], Vec::new());
        let bytes = codec().encode(&submission).unwrap();
        let err = codec().decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, RingsettleError::TruncatedInput { .. }), "{err}");
        assert!(err.is_fatal());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = codec().encode(&Submission::default()).unwrap();
        bytes.push(0);
        let err = codec().decode(&bytes).unwrap_err();
        assert!(matches!(err, RingsettleError::InvalidEncoding { .. }));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = codec().encode(&Submission::default()).unwrap();
        bytes[1] = 9;
        assert_eq!(
            codec().decode(&bytes).unwrap_err(),
            RingsettleError::UnsupportedVersion(9)
        );
    }

    #[test]
    fn unknown_token_type_code_is_rejected() {
        let mut order = plain_order(0xa0, 1, 2);
        order.token_type_s = TokenType::Partitioned;
        let mut bytes = codec()
            .encode(&Submission::new(vec![order], Vec::new()))
            .unwrap();
        // The token type is the last byte of the only order, before the ring count.
        let position = bytes.len() - 3;
        assert_eq!(bytes[position], TokenType::Partitioned.code());
        bytes[position] = 7;
        assert_eq!(
            codec().decode(&bytes).unwrap_err(),
            RingsettleError::UnknownTokenType(7)
        );
    }

    #[test]
    fn oversized_ring_cannot_be_encoded() {
        let submission = Submission::new(Vec::new(), vec![Ring::new(vec![0; 300])]);
        assert!(codec().encode(&submission).is_err());
    }

    fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    fn arb_amount() -> impl Strategy<Value = Amount> {
        any::<[u8; 32]>().prop_map(Amount::from_be_bytes)
    }

    prop_compose! {
        fn arb_order()(
            (owner, token_s, token_b, recipient, fee_token) in
                (arb_address(), arb_address(), arb_address(), arb_address(), arb_address()),
            (amount_s, amount_b, fee_amount) in (arb_amount(), arb_amount(), arb_amount()),
            (valid_since, valid_until, version) in (any::<u64>(), any::<u64>(), any::<u32>()),
            (broker, wallet) in (proptest::option::of(arb_address()), proptest::option::of(arb_address())),
            (split, waive, fee_s, fee_b) in (any::<u8>(), any::<u16>(), any::<u16>(), any::<u16>()),
            (all_or_none, on_chain, partitioned_s, partitioned_b) in
                (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
            tranche in any::<[u8; 32]>(),
            data in proptest::collection::vec(any::<u8>(), 0..16),
        ) -> Order {
            let mut order = Order::new(owner, token_s, token_b, amount_s, amount_b, token(BASE));
            order.token_recipient = recipient;
            order.fee_token = fee_token;
            order.fee_amount = fee_amount;
            order.valid_since = valid_since;
            order.valid_until = valid_until;
            order.version = version;
            order.broker = broker;
            order.wallet_addr = wallet;
            order.wallet_split_percentage = split;
            order.waive_fee_percentage = waive;
            order.token_s_fee_percentage = fee_s;
            order.token_b_fee_percentage = fee_b;
            order.all_or_none = all_or_none;
            order.on_chain = on_chain;
            if partitioned_s {
                order.token_type_s = TokenType::Partitioned;
            }
            if partitioned_b {
                order.token_type_b = TokenType::Partitioned;
            }
            order.tranche_s = Tranche::from_bytes(tranche);
            order.transfer_data_s = data;
            order
        }
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            orders in proptest::collection::vec(arb_order(), 0..4),
            rings in proptest::collection::vec(proptest::collection::vec(0usize..8, 2..5), 0..3),
            fee_recipient in proptest::option::of(arb_address()),
        ) {
            let submission = Submission {
                fee_recipient,
                ..Submission::new(orders, rings.into_iter().map(Ring::new).collect())
            };
            let bytes = codec().encode(&submission).unwrap();
            let decoded = codec().decode(&bytes).unwrap();
            prop_assert_eq!(decoded.order_hashes(), submission.order_hashes());
            prop_assert_eq!(decoded, submission);
        }
    }
}
