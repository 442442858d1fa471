//! WPS PIN generation: MAC-derived, empty and static vendor algorithms,
//! plus OUI-based suggestion.

use crate::mac::MacAddress;
use crate::{Error, Result};

/// Standard WPS checksum digit for a 7-digit PIN body.
pub fn checksum(mut body: u32) -> u32 {
    let mut accum = 0;
    while body > 0 {
        accum += 3 * (body % 10);
        body /= 10;
        accum += body % 10;
        body /= 10;
    }
    (10 - accum % 10) % 10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgoMode {
    Mac,
    Empty,
    Static,
}

#[derive(Clone, Copy)]
enum Generator {
    Derived(fn(MacAddress) -> u64),
    Empty,
    Fixed(u32),
}

pub struct Algorithm {
    pub id: &'static str,
    pub name: &'static str,
    pub mode: AlgoMode,
    generator: Generator,
}

impl Algorithm {
    /// The full PIN for this algorithm, or the empty string for the empty
    /// algorithm. Derived and static bodies are reduced modulo 10^7 and
    /// rendered as 7 zero-padded digits plus the checksum digit.
    pub fn pin(&self, mac: MacAddress) -> String {
        let body = match self.generator {
            Generator::Empty => return String::new(),
            Generator::Derived(derive) => derive(mac),
            Generator::Fixed(value) => u64::from(value),
        };
        let body = (body % 10_000_000) as u32;
        format!("{:07}{}", body, checksum(body))
    }

    /// Human name, with static entries marked the way the selection table
    /// expects them.
    pub fn display_name(&self) -> String {
        match self.mode {
            AlgoMode::Static => format!("Static PIN — {}", self.name),
            _ => self.name.to_string(),
        }
    }
}

/// A generated candidate, ready for display or use.
pub struct PinCandidate {
    pub id: &'static str,
    pub name: String,
    pub pin: String,
}

fn pin24(mac: MacAddress) -> u64 {
    mac.integer() & 0xFFFFFF
}

fn pin28(mac: MacAddress) -> u64 {
    mac.integer() & 0xFFFFFFF
}

fn pin32(mac: MacAddress) -> u64 {
    mac.integer() % 0x100000000
}

fn pin_dlink(mac: MacAddress) -> u64 {
    let nic = mac.integer() & 0xFFFFFF;
    let mut pin = nic ^ 0x55AA55;
    pin ^= ((pin & 0xF) << 4)
        + ((pin & 0xF) << 8)
        + ((pin & 0xF) << 12)
        + ((pin & 0xF) << 16)
        + ((pin & 0xF) << 20);
    pin %= 10_000_000;
    if pin < 1_000_000 {
        pin += ((pin % 9) + 1) * 1_000_000;
    }
    pin
}

fn pin_dlink1(mac: MacAddress) -> u64 {
    pin_dlink(mac.successor())
}

fn pin_asus(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u32::from);
    let tail = b[1] + b[2] + b[3] + b[4] + b[5];
    let mut pin = 0u64;
    for i in 0..7u32 {
        let digit = (b[(i % 6) as usize] + b[5]) % (10 - (i + tail) % 7);
        pin = pin * 10 + u64::from(digit);
    }
    pin
}

fn pin_airocon(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    (b[0] + b[1]) % 10
        + ((b[5] + b[0]) % 10) * 10
        + ((b[4] + b[5]) % 10) * 100
        + ((b[3] + b[4]) % 10) * 1_000
        + ((b[2] + b[3]) % 10) * 10_000
        + ((b[1] + b[2]) % 10) * 100_000
        + ((b[0] + b[1]) % 10) * 1_000_000
}

fn pin_mtk(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    (b[0] + b[1] + b[2] + b[3]) % 10
        + ((b[1] + b[2] + b[3] + b[4]) % 10) * 10
        + ((b[2] + b[3] + b[4] + b[5]) % 10) * 100
        + ((b[3] + b[4] + b[5] + b[0]) % 10) * 1_000
        + ((b[4] + b[5] + b[0] + b[1]) % 10) * 10_000
        + ((b[5] + b[0] + b[1] + b[2]) % 10) * 100_000
        + ((b[0] + b[1] + b[2] + b[3]) % 10) * 1_000_000
}

// Same positional layout as the Airocon derivation.
fn pin_rtk(mac: MacAddress) -> u64 {
    pin_airocon(mac)
}

fn pin_tplink(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    let low = (b[0] + b[1] + b[2]) % 10;
    let high = (b[3] + b[4] + b[5]) % 10;
    low + high * 10 + low * 100 + high * 1_000 + low * 10_000 + high * 100_000 + low * 1_000_000
}

fn pin_zte(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    (b[5] + b[0] + b[1]) % 10
        + ((b[1] + b[2] + b[3]) % 10) * 10
        + ((b[2] + b[3] + b[4]) % 10) * 100
        + ((b[3] + b[4] + b[5]) % 10) * 1_000
        + ((b[0] + b[1] + b[2]) % 10) * 10_000
        + ((b[1] + b[2] + b[3]) % 10) * 100_000
        + ((b[2] + b[3] + b[4]) % 10) * 1_000_000
}

fn pin_huawei(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    (b[0] ^ b[3]) % 10
        + ((b[1] ^ b[4]) % 10) * 10
        + ((b[2] ^ b[5]) % 10) * 100
        + ((b[3] ^ b[0]) % 10) * 1_000
        + ((b[4] ^ b[1]) % 10) * 10_000
        + ((b[5] ^ b[2]) % 10) * 100_000
        + ((b[0] ^ b[3]) % 10) * 1_000_000
}

fn pin_comtrend(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(i64::from);
    let digit = (b[0] + b[1] + b[2] - b[3] - b[4] - b[5]).rem_euclid(10) as u64;
    digit * 1_111_111
}

fn pin_netgear(mac: MacAddress) -> u64 {
    let b = mac.bytes().map(u64::from);
    (b[0] + b[3] + b[5]) % 10
        + ((b[1] + b[4] + b[2]) % 10) * 10
        + ((b[2] + b[5] + b[1]) % 10) * 100
        + ((b[3] + b[0] + b[4]) % 10) * 1_000
        + ((b[4] + b[1] + b[3]) % 10) * 10_000
        + ((b[5] + b[2] + b[0]) % 10) * 100_000
        + ((b[0] + b[3] + b[5]) % 10) * 1_000_000
}

/// The full catalog, in presentation order.
pub const ALGORITHMS: &[Algorithm] = &[
    Algorithm { id: "pin24", name: "24-bit PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin24) },
    Algorithm { id: "pin28", name: "28-bit PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin28) },
    Algorithm { id: "pin32", name: "32-bit PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin32) },
    Algorithm { id: "pinDLink", name: "D-Link PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_dlink) },
    Algorithm { id: "pinDLink1", name: "D-Link PIN +1", mode: AlgoMode::Mac, generator: Generator::Derived(pin_dlink1) },
    Algorithm { id: "pinASUS", name: "ASUS PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_asus) },
    Algorithm { id: "pinAirocon", name: "Airocon Realtek", mode: AlgoMode::Mac, generator: Generator::Derived(pin_airocon) },
    Algorithm { id: "pinMTK", name: "MediaTek PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_mtk) },
    Algorithm { id: "pinRTK", name: "Realtek New", mode: AlgoMode::Mac, generator: Generator::Derived(pin_rtk) },
    Algorithm { id: "pinTPLink", name: "TP-Link PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_tplink) },
    Algorithm { id: "pinZTE", name: "ZTE PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_zte) },
    Algorithm { id: "pinHuawei", name: "Huawei PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_huawei) },
    Algorithm { id: "pinComtrend", name: "Comtrend PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_comtrend) },
    Algorithm { id: "pinNetgear", name: "Netgear PIN", mode: AlgoMode::Mac, generator: Generator::Derived(pin_netgear) },
    Algorithm { id: "pinEmpty", name: "Empty PIN", mode: AlgoMode::Empty, generator: Generator::Empty },
    Algorithm { id: "pinCisco", name: "Cisco", mode: AlgoMode::Static, generator: Generator::Fixed(1234567) },
    Algorithm { id: "pinBrcm1", name: "Broadcom 1", mode: AlgoMode::Static, generator: Generator::Fixed(2017252) },
    Algorithm { id: "pinBrcm2", name: "Broadcom 2", mode: AlgoMode::Static, generator: Generator::Fixed(4626484) },
    Algorithm { id: "pinBrcm3", name: "Broadcom 3", mode: AlgoMode::Static, generator: Generator::Fixed(7622990) },
    Algorithm { id: "pinBrcm4", name: "Broadcom 4", mode: AlgoMode::Static, generator: Generator::Fixed(6232714) },
    Algorithm { id: "pinBrcm5", name: "Broadcom 5", mode: AlgoMode::Static, generator: Generator::Fixed(1086411) },
    Algorithm { id: "pinBrcm6", name: "Broadcom 6", mode: AlgoMode::Static, generator: Generator::Fixed(3195719) },
    Algorithm { id: "pinAirc1", name: "Airocon 1", mode: AlgoMode::Static, generator: Generator::Fixed(3043203) },
    Algorithm { id: "pinAirc2", name: "Airocon 2", mode: AlgoMode::Static, generator: Generator::Fixed(7141225) },
    Algorithm { id: "pinDSL2740R", name: "DSL-2740R", mode: AlgoMode::Static, generator: Generator::Fixed(6817554) },
    Algorithm { id: "pinRealtek1", name: "Realtek 1", mode: AlgoMode::Static, generator: Generator::Fixed(9566146) },
    Algorithm { id: "pinRealtek2", name: "Realtek 2", mode: AlgoMode::Static, generator: Generator::Fixed(9571911) },
    Algorithm { id: "pinRealtek3", name: "Realtek 3", mode: AlgoMode::Static, generator: Generator::Fixed(4856371) },
    Algorithm { id: "pinUpvel", name: "Upvel", mode: AlgoMode::Static, generator: Generator::Fixed(2085483) },
    Algorithm { id: "pinUR814AC", name: "UR-814AC", mode: AlgoMode::Static, generator: Generator::Fixed(4397768) },
    Algorithm { id: "pinUR825AC", name: "UR-825AC", mode: AlgoMode::Static, generator: Generator::Fixed(529417) },
    Algorithm { id: "pinOnlime", name: "Onlime", mode: AlgoMode::Static, generator: Generator::Fixed(9995604) },
    Algorithm { id: "pinEdimax", name: "Edimax", mode: AlgoMode::Static, generator: Generator::Fixed(3561153) },
    Algorithm { id: "pinThomson", name: "Thomson", mode: AlgoMode::Static, generator: Generator::Fixed(6795814) },
    Algorithm { id: "pinHG532x", name: "HG532x", mode: AlgoMode::Static, generator: Generator::Fixed(3425928) },
    Algorithm { id: "pinH108L", name: "H108L", mode: AlgoMode::Static, generator: Generator::Fixed(9422988) },
    Algorithm { id: "pinONO", name: "CBN ONO", mode: AlgoMode::Static, generator: Generator::Fixed(9575521) },
    Algorithm { id: "pinASUSRT", name: "ASUS RT", mode: AlgoMode::Static, generator: Generator::Fixed(8427531) },
    Algorithm { id: "pinZyxel", name: "ZyXEL", mode: AlgoMode::Static, generator: Generator::Fixed(7953513) },
];

pub fn find(id: &str) -> Option<&'static Algorithm> {
    ALGORITHMS.iter().find(|algo| algo.id == id)
}

/// Generate the PIN for a named algorithm.
pub fn generate(id: &str, mac: MacAddress) -> Result<String> {
    let algo = find(id).ok_or_else(|| Error::InvalidAlgorithm {
        wrong_id: id.to_string(),
    })?;
    Ok(algo.pin(mac))
}

/// All catalog PINs for one MAC, optionally without the static entries.
pub fn all(mac: MacAddress, include_static: bool) -> Vec<PinCandidate> {
    ALGORITHMS
        .iter()
        .filter(|algo| include_static || algo.mode != AlgoMode::Static)
        .map(|algo| PinCandidate {
            id: algo.id,
            name: algo.display_name(),
            pin: algo.pin(mac),
        })
        .collect()
}

/// Candidates for the algorithms suggested by the vendor OUI tables.
pub fn suggested(mac: MacAddress) -> Vec<PinCandidate> {
    suggest_ids(mac)
        .into_iter()
        .filter_map(find)
        .map(|algo| PinCandidate {
            id: algo.id,
            name: algo.display_name(),
            pin: algo.pin(mac),
        })
        .collect()
}

/// Suggested PINs only, in suggestion order.
pub fn suggested_pins(mac: MacAddress) -> Vec<String> {
    suggested(mac).into_iter().map(|c| c.pin).collect()
}

/// The most likely PIN for this MAC, if any algorithm is suggested.
pub fn likely(mac: MacAddress) -> Option<String> {
    suggested_pins(mac).into_iter().next()
}

fn suggest_ids(mac: MacAddress) -> Vec<&'static str> {
    let hex = mac.hex_upper();
    let mut res: Vec<&'static str> = SUGGESTION_TABLE
        .iter()
        .filter(|(_, ouis)| ouis.iter().any(|oui| hex.starts_with(oui)))
        .map(|(id, _)| *id)
        .collect();
    if res.is_empty() {
        res.extend(["pin24", "pin28", "pin32"]);
    }
    if BRCM_OUIS.iter().any(|oui| hex.starts_with(oui)) {
        res.extend(["pinBrcm1", "pinBrcm2", "pinBrcm3"]);
    }
    res
}

const SUGGESTION_TABLE: &[(&str, &[&str])] = &[
    ("pinTPLink", TPLINK_OUIS),
    ("pinDLink", DLINK_OUIS),
    ("pinASUS", ASUS_OUIS),
    ("pinRTK", RTK_OUIS),
    ("pinMTK", MTK_OUIS),
    ("pinBrcm1", BRCM_OUIS),
    ("pinZyxel", ZYXEL_OUIS),
    ("pinHuawei", HUAWEI_OUIS),
];

const TPLINK_OUIS: &[&str] = &[
    "00194D", "001D0F", "002127", "0023CD", "002586", "002719", "081F71", "0C4B54", "0C722C",
    "1040F3", "140467", "14144B", "14CF92", "1C3BF3", "1C710D", "24695A", "28EE52", "302E38",
    "30B49E", "34E894", "388345", "3C3786", "40169F", "403F8C", "44B32D", "4CE676", "50BD5F",
    "50C7BF", "50FA84", "547595", "5C899A", "645601", "6466B3", "706F81", "74EA3A", "7844FD",
    "7C8BCA", "803F5D", "84162B", "8C210A", "90AE1B", "90F652", "94D9B3", "A0F3C1", "A42BB0",
    "AC84C9", "B0487A", "B04E26", "B8D50B", "C025E9", "C04A00", "C46E1F", "CC32E5", "D84732",
    "DC0B34", "E005C5", "E4D332", "E894F6", "EC086B", "EC172F", "EC888F", "F4EC38", "F81A67",
    "F8D111", "FC4D8C",
];

const DLINK_OUIS: &[&str] = &[
    "00112F", "0015E9", "00179A", "001B11", "001CF0", "001E58", "002191", "0022B0", "002401",
    "00265A", "0CB6D2", "1062EB", "14D64D", "1C7EE5", "28107B", "340804", "3C1E04", "48EE0C",
    "54B80A", "5CD998", "74DADA", "78542E", "84C9B2", "A0AB1B", "B8A386", "BC0F9A", "BC4486",
    "C4A81D", "C8BE19", "C8D3A3", "CCB255", "F0B4D2", "FC7516",
];

const ASUS_OUIS: &[&str] = &[
    "049226", "04D9F5", "08606E", "086266", "107B44", "10BF48", "10C37B", "14DDA9", "1C872C",
    "1CB72C", "2C56DC", "2CFDA1", "305A3A", "382C4A", "38D547", "40167E", "50465D", "54A050",
    "6045CB", "60A44C", "704D7B", "74D02B", "7824AF", "88D7F6", "9C5C8E", "AC220B", "AC9E17",
    "B06EBF", "BCEE7B", "C86000", "D017C2", "D850E6", "E03F49", "F07957", "F832E4",
];

const RTK_OUIS: &[&str] = &[
    "000C42", "000E8F", "001B2F", "00147C", "0017C5", "0019E0", "001AE3", "001D6A", "002268",
    "00E04C", "089E08", "0C4DE9", "10C37B", "1C4419", "2C27D7", "2C4D54", "33B26E", "406F2A",
    "44E9DD", "4CE676", "5084FB", "74DA88", "78471D", "78541A", "78D34B", "7CFF4D", "8C8401",
    "8CFDF0", "98DED0", "B4EED4", "B8D50B", "C8AA21", "CC2D83", "D0C0BF", "D86CE9", "E0D55E",
    "E4FB8F", "EC086B", "EC1A59", "EC888F", "F4C7146", "F832E4",
];

const MTK_OUIS: &[&str] = &[
    "008BDF", "00BB3A", "00E04C", "0C4DE9", "147590", "1C740D", "2C27D7", "2CAB25", "38B1DB",
    "44E9DD", "4CE676", "5084FB", "74DA88", "78471D", "78541A", "78D34B", "7CFF4D", "8C8401",
    "8CFDF0", "98DED0", "B4EED4", "B8D50B", "C8AA21", "CC2D83", "D0C0BF", "D86CE9", "E0D55E",
    "E4FB8F", "EC086B", "EC1A59", "EC888F", "F4C714", "F832E4",
];

const BRCM_OUIS: &[&str] = &[
    "000E08", "001018", "0014BF", "001632", "00184D", "001A2B", "001B2F", "001CB3", "001E8C",
    "002275", "00235A", "002401", "00259C", "0026CE", "004075", "084E1C", "084EBF", "086698",
    "08863B", "0C8112", "100BA9", "14144B", "14D64D", "1C4419", "203CAE", "2405F5", "28107B",
    "28EE52", "30F772", "38B1DB", "38E3C5", "40167E", "44E9DD", "48EE0C", "4C14A3", "4CE676",
    "54B80A", "5C164A", "5C8FE0", "5CB066", "5CF4AB", "607EDD", "608334", "60A44C", "6466B3",
    "647002", "68ECC5", "6CAAB3", "6CFDB9", "78471D", "78541A", "78D34B", "7CFF4D", "8C8401",
    "8CFDF0", "98DED0", "B4EED4", "B8D50B", "C8AA21", "CC2D83", "D0C0BF", "D86CE9", "E0D55E",
    "E4FB8F", "EC086B", "EC1A59", "EC888F", "F4C714", "F832E4",
];

const ZYXEL_OUIS: &[&str] = &[
    "001349", "004BF3", "086698", "1C740D", "2C27D7", "40B7F3", "44D437", "48EE0C", "54B80A",
    "5C6A7D", "5CE286", "74DE2B", "7C2664", "90EF68", "98F7D7", "B0B2DC", "B8D50B", "CC5D4E",
    "E0D55E", "E4E7C9", "E8377D", "EC4318", "F0B7B7",
];

const HUAWEI_OUIS: &[&str] = &[
    "001882", "001E10", "002568", "00259E", "002EC7", "00464B", "008025", "043389", "083FBC",
    "0C37DC", "105172", "143004", "2008ED", "2469A5", "286ED4", "28DEE5", "3C7843", "487B6B",
    "4C5499", "4CF95D", "4CFB45", "50016B", "50680A", "544A16", "58605F", "5C4CA9", "60D755",
    "70723C", "781DBA", "786A89", "7C1CF1", "7C6097", "7CA177", "80717A", "80B686", "80FB06",
    "843DC6", "84BE52", "88A6C6", "88E3AB", "9C28EF", "9CE374", "A0A33B", "A4C64F", "AC4E91",
    "AC853D", "ACA213", "B41513", "B808D7", "BC7670", "C4473F", "C4F081", "C8D15E", "CC53B5",
    "D07AB5", "D46AA8", "D46E5C", "D494E8", "D8490B", "DC094C", "DC729B", "E0247F", "E09796",
    "E4C2D1", "E8088B", "EC233D", "F04347", "F09838", "F49FF3", "F4C714", "F83DFF",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::MacAddress;

    fn mac(s: &str) -> MacAddress {
        s.parse().unwrap()
    }

    #[test]
    fn checksum_closes_the_digit_sum() {
        // The weighted digit sum of body plus checksum is divisible by 10.
        for body in [0u32, 1, 1234567, 1122867, 9999999, 5613141] {
            let check = checksum(body);
            let mut accum = check;
            let mut rest = body;
            let mut odd = true;
            while rest > 0 {
                let weight = if odd { 3 } else { 1 };
                accum += weight * (rest % 10);
                rest /= 10;
                odd = !odd;
            }
            assert_eq!(accum % 10, 0, "body {body}");
        }
    }

    #[test]
    fn cisco_static_pin_has_zero_checksum() {
        assert_eq!(checksum(1234567), 0);
        assert_eq!(generate("pinCisco", mac("00:11:22:33:44:55")).unwrap(), "12345670");
    }

    #[test]
    fn pin24_known_value() {
        let pin = generate("pin24", mac("00:11:22:33:44:55")).unwrap();
        // 0x112233 % 10^7 = 1122867
        assert_eq!(&pin[..7], "1122867");
        assert_eq!(pin, format!("1122867{}", checksum(1122867)));
    }

    #[test]
    fn dlink_small_body_is_bumped() {
        // All-zero NIC: 0 ^ 0x55AA55 = 5613141, above the bump threshold.
        assert_eq!(pin_dlink(mac("00:00:00:00:00:00")), 5613141);
        // Any body under 10^6 is lifted into the 7-digit range.
        for raw in 0u64..48 {
            let m = MacAddress::new(raw).unwrap();
            let body = pin_dlink(m);
            assert!(body < 10_000_000);
        }
    }

    #[test]
    fn dlink_plus_one_uses_the_next_mac() {
        let base = mac("1C:AF:F7:12:34:56");
        assert_eq!(pin_dlink1(base), pin_dlink(base.successor()));
    }

    #[test]
    fn generated_pins_are_empty_or_eight_digits() {
        let m = mac("14:CF:92:AA:BB:CC");
        for candidate in all(m, true) {
            if candidate.id == "pinEmpty" {
                assert_eq!(candidate.pin, "");
            } else {
                assert_eq!(candidate.pin.len(), 8, "{}", candidate.id);
                assert!(candidate.pin.bytes().all(|b| b.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn empty_algorithm_yields_empty_string() {
        assert_eq!(generate("pinEmpty", mac("00:11:22:33:44:55")).unwrap(), "");
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        assert!(generate("pinBogus", mac("00:11:22:33:44:55")).is_err());
    }

    #[test]
    fn suggestion_includes_tplink_for_tplink_oui() {
        let ids: Vec<&str> = suggested(mac("14:CF:92:AA:BB:CC"))
            .iter()
            .map(|c| c.id)
            .collect();
        assert!(ids.contains(&"pinTPLink"));
    }

    #[test]
    fn suggestion_falls_back_to_generic_algorithms() {
        let ids: Vec<&str> = suggested(mac("02:00:00:AA:BB:CC"))
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, ["pin24", "pin28", "pin32"]);
    }

    #[test]
    fn broadcom_oui_appends_static_candidates() {
        let ids: Vec<&str> = suggested(mac("00:14:BF:AA:BB:CC"))
            .iter()
            .map(|c| c.id)
            .collect();
        assert!(ids.contains(&"pinBrcm2"));
        assert!(ids.contains(&"pinBrcm3"));
    }

    #[test]
    fn suggestion_depends_on_oui_only() {
        let a: Vec<&str> = suggested(mac("14:CF:92:00:00:01")).iter().map(|c| c.id).collect();
        let b: Vec<&str> = suggested(mac("14:CF:92:FF:EE:DD")).iter().map(|c| c.id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn likely_picks_the_first_suggestion() {
        let m = mac("14:CF:92:AA:BB:CC");
        assert_eq!(likely(m), Some(generate("pinTPLink", m).unwrap()));
        assert_eq!(likely(mac("02:00:00:00:00:00")), Some(generate("pin24", mac("02:00:00:00:00:00")).unwrap()));
    }

    #[test]
    fn generation_is_deterministic() {
        let m = mac("D8:47:32:11:22:33");
        for algo in ALGORITHMS {
            assert_eq!(algo.pin(m), algo.pin(m), "{}", algo.id);
        }
    }
}
