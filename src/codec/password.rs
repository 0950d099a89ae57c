// -----------------------------------------------------------------------------
// ----- OPEN password ---------------------------------------------------------

const MASK: u64 = 0xFFFF_FFFF;

/// OPEN numeric password algorithm.
///
/// The gateway challenges with a decimal nonce; the client answers with this
/// digest of its numeric password. Each nonce digit selects a rotate/swap of
/// the running 32-bit value.
pub fn own_password(password: u32, nonce: &str) -> u32 {
    let mut started = false;
    let mut num1: u64 = 0;
    let mut num2: u64 = 0;

    for c in nonce.chars() {
        if c != '0' {
            if !started {
                num2 = u64::from(password);
            }
            started = true;
        }

        match c {
            '1' => {
                num1 = (num2 & 0xFFFF_FF80) >> 7;
                num2 <<= 25;
            }
            '2' => {
                num1 = (num2 & 0xFFFF_FFF0) >> 4;
                num2 <<= 28;
            }
            '3' => {
                num1 = (num2 & 0xFFFF_FFF8) >> 3;
                num2 <<= 29;
            }
            '4' => {
                num1 = num2 << 1;
                num2 >>= 31;
            }
            '5' => {
                num1 = num2 << 5;
                num2 >>= 27;
            }
            '6' => {
                num1 = num2 << 12;
                num2 >>= 20;
            }
            '7' => {
                num1 = (num2 & 0x0000_FF00)
                    | ((num2 & 0x0000_00FF) << 24)
                    | ((num2 & 0x00FF_0000) >> 16);
                num2 = ((num2 & 0xFF00_0000) >> 8) | ((num2 & 0x00FF_0000) << 8);
            }
            '8' => {
                num1 = ((num2 & 0x0000_FFFF) << 16) | (num2 >> 24);
                num2 = (num2 & 0x00FF_0000) >> 8;
            }
            '9' => {
                num1 = !num2;
            }
            _ => {
                num1 = num2;
            }
        }

        num1 &= MASK;
        num2 &= MASK;

        if c != '0' && c != '9' {
            num1 |= num2;
        }
        num2 = num1;
    }

    num1 as u32
}

// -----------------------------------------------------------------------------
// ----- Tests -----------------------------------------------------------------


// -----------------------------------------------------------------------------
// -----------------------------------------------------------------------------
