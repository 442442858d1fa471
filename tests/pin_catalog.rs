use oneshot::MacAddress;
use oneshot::pins;

fn mac(s: &str) -> MacAddress {
    s.parse().expect("parse MAC")
}

#[test]
fn test_pin24_for_known_mac() {
    // 0x112233 = 1122867, plus its checksum digit.
    let pin = pins::generate("pin24", mac("00:11:22:33:44:55")).unwrap();
    assert_eq!(&pin[..7], "1122867");
    let checksum = pin.as_bytes()[7] - b'0';
    assert_eq!(u32::from(checksum), pins::checksum(1122867));
}

#[test]
fn test_dlink_on_zero_mac() {
    // 0 ^ 0x55AA55 = 5613141; above the bump threshold, so the body is
    // taken as-is.
    let pin = pins::generate("pinDLink", mac("00:00:00:00:00:00")).unwrap();
    assert_eq!(&pin[..7], "5613141");
}

#[test]
fn test_tplink_oui_is_suggested() {
    let suggested = pins::suggested(mac("14:CF:92:AA:BB:CC"));
    assert!(suggested.iter().any(|c| c.id == "pinTPLink"));
}

#[test]
fn test_empty_pin_renders_as_empty_string() {
    assert_eq!(pins::generate("pinEmpty", mac("00:11:22:33:44:55")).unwrap(), "");
}

#[test]
fn test_cisco_static_pin() {
    assert_eq!(pins::checksum(1234567), 0);
    assert_eq!(pins::generate("pinCisco", mac("00:11:22:33:44:55")).unwrap(), "12345670");
}

#[test]
fn test_all_without_statics_is_mac_and_empty_only() {
    let candidates = pins::all(mac("00:11:22:33:44:55"), false);
    assert!(candidates.iter().all(|c| !c.name.starts_with("Static PIN")));
    assert!(candidates.iter().any(|c| c.id == "pinEmpty"));
}

#[test]
fn test_full_pin_digit_sum_law() {
    // 3*d0 + d1 + 3*d2 + d3 + 3*d4 + d5 + 3*d6 + checksum == 0 (mod 10),
    // digits indexed from the low end of the 7-digit body.
    for body in (0..10_000_000u32).step_by(98_765) {
        let mut accum = pins::checksum(body);
        let mut rest = body;
        let mut weight_three = true;
        while rest > 0 {
            accum += if weight_three { 3 * (rest % 10) } else { rest % 10 };
            rest /= 10;
            weight_three = !weight_three;
        }
        assert_eq!(accum % 10, 0, "body {body}");
    }
}
