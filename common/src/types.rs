//! 共通型定義
//!
//! PublicKey, ServiceAddr, ServiceEntry等のコアデータ型

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// 公開鍵の16進文字列長（33バイト）
const PUBLIC_KEY_HEX_LEN: usize = 66;

/// 秘密鍵の16進文字列長（32バイト）
const SECRET_KEY_HEX_LEN: usize = 64;

/// 署名の16進文字列長（65バイト）
const SIGNATURE_HEX_LEN: usize = 130;

fn parse_hex(raw: &str, expected_len: usize, what: &str) -> Result<String, MonitorError> {
    if raw.len() != expected_len || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MonitorError::Validation(format!(
            "invalid {what}: expected {expected_len} hex chars, got {raw:?}"
        )));
    }
    Ok(raw.to_ascii_lowercase())
}

/// VPNサーバーを識別する公開鍵
///
/// サービスディスカバリ上のアドレスから抽出される66桁の16進文字列。
/// 取得後は不変で、値で比較される。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey(String);

impl PublicKey {
    /// 16進文字列表現を返す
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl FromStr for PublicKey {
    type Err = MonitorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_hex(raw, PUBLIC_KEY_HEX_LEN, "public key").map(PublicKey)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = MonitorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<PublicKey> for String {
    fn from(pk: PublicKey) -> Self {
        pk.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// monitor自身の秘密鍵
///
/// コアの監視ロジックでは未使用。デプロイ済み設定フォーマットとの
/// 互換のために保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretKey(String);

impl SecretKey {
    /// 16進文字列表現を返す
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl FromStr for SecretKey {
    type Err = MonitorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_hex(raw, SECRET_KEY_HEX_LEN, "secret key").map(SecretKey)
    }
}

impl TryFrom<String> for SecretKey {
    type Error = MonitorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<SecretKey> for String {
    fn from(sk: SecretKey) -> Self {
        sk.0
    }
}

/// 登録解除の権限を証明する署名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature(String);

impl Signature {
    /// 16進文字列表現を返す
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = MonitorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_hex(raw, SIGNATURE_HEX_LEN, "signature").map(Signature)
    }
}

impl TryFrom<String> for Signature {
    type Error = MonitorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.0
    }
}

/// サービスディスカバリ上のネットワークアドレス
///
/// `"<公開鍵>:<ポート>"` 形式。ポートは省略されることがある。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceAddr {
    pk: PublicKey,
    port: Option<u16>,
}

impl ServiceAddr {
    /// アドレスに含まれる公開鍵
    pub fn public_key(&self) -> &PublicKey {
        &self.pk
    }

    /// アドレスに含まれるポート番号
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl FromStr for ServiceAddr {
    type Err = MonitorError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once(':') {
            Some((pk, port)) => {
                let port = port.parse().map_err(|_| {
                    MonitorError::Validation(format!("invalid service address port: {raw:?}"))
                })?;
                Ok(ServiceAddr {
                    pk: pk.parse()?,
                    port: Some(port),
                })
            }
            None => Ok(ServiceAddr {
                pk: raw.parse()?,
                port: None,
            }),
        }
    }
}

impl TryFrom<String> for ServiceAddr {
    type Error = MonitorError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<ServiceAddr> for String {
    fn from(addr: ServiceAddr) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for ServiceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.pk, port),
            None => write!(f, "{}", self.pk),
        }
    }
}

/// サービスディスカバリが返すサービスレコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// ネットワークアドレス
    pub address: ServiceAddr,
    /// サービス種別（"vpn"等）
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    /// サーバーのバージョン
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
