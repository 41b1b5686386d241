//! Wire fixtures shared by the unit tests.

/// version 1, plan key 0335eb..c87a, previous block sha256("prev"), merkle
/// root over sha256("tx1"), sha256("tx2"), sha256("tx3"), zero previous
/// anchor, time 1_500_000_000
pub const HEADER_HEX: &str = "010000007ac8cf9dfa179ce3605980e07edc8ebcf47973cfc329bebc61ff4c25a8bdeb3503f7ede8a8acf5b3735f3e98086ea937c5f8a74f209682345491d73a33ac9bfd84b3ba027af305d6a9ed2c3627be3125cf02b00f0f15802c7f10773dca7c22db580000000000000000000000000000000000000000000000000000000000000000002f6859";

/// The header above, its three transactions and signature blob 0102030405
pub const FULL_HEX: &str = "010000007ac8cf9dfa179ce3605980e07edc8ebcf47973cfc329bebc61ff4c25a8bdeb3503f7ede8a8acf5b3735f3e98086ea937c5f8a74f209682345491d73a33ac9bfd84b3ba027af305d6a9ed2c3627be3125cf02b00f0f15802c7f10773dca7c22db580000000000000000000000000000000000000000000000000000000000000000002f6859031b209ab716e8ca81422d9173a1ab7cddbfc520eed05b1238a8f5a03dbd559b70e3a179a7c83391ad2ffd73d190756adeb145e845ed25c5edc759a992c064ca27a9b7c8e2d1bb935daebe395ee05dc705f071eca6118cbbd6d75662898eb13c1f050504030201";

pub const BLOCK_HASH: &str = "f15ec3fe2d05751767b66e19bd1733a9702b08132032e5aae8347bd94ca62232";

pub const MERKLE_ROOT: &str = "58db227cca3d77107f2c80150f0fb002cf2531be27362ceda9d605f37a02bab3";

pub const PLAN_KEY: &str = "0335ebbda8254cff61bcbe29c3cf7379f4bc8edc7ee0805960e39c17fa9dcfc87a";

pub const FIXTURE_TIME: u32 = 1_500_000_000;
