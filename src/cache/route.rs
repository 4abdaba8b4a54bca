use crate::cache::block::BLOCK_BITS;

/// Number of logical address channels presented per transaction.
pub const CHANNELS: usize = 5;

/// Number of cache banks behind the channels.
pub const NUM_BANKS: usize = 4;

pub type BankId = usize;

/// Bank targeted by each channel. Channels 1 and 3 share bank 1.
pub const CHANNEL_BANK: [BankId; CHANNELS] = [0, 1, 2, 1, 3];

/// Channel processing order within a transaction. Channel 3 runs right after
/// channel 1 so it observes channel 1's effects on their shared bank.
pub const DISPATCH_ORDER: [usize; CHANNELS] = [0, 1, 3, 2, 4];

pub fn bank_for_channel(channel: usize) -> BankId {
    CHANNEL_BANK[channel]
}

/// Addresses are checked against the bus width in bits, not the payload size
/// in bytes. Changing the constant changes which inputs get rejected.
pub fn is_aligned(addr: u32) -> bool {
    addr % BLOCK_BITS == 0
}

/// Splits an address into (slot, group tag) relative to a bank's slot count.
/// The tag field is 16 bits wide; quotient bits above it do not participate
/// in matching.
pub fn split_addr(addr: u32, num_slots: usize) -> (usize, u16) {
    let num_slots = num_slots.max(1) as u32;
    let slot = (addr % num_slots) as usize;
    let tag = (addr / num_slots) as u16;
    (slot, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_addr_separates_slot_and_tag() {
        assert_eq!(split_addr(0, 512), (0, 0));
        assert_eq!(split_addr(522, 512), (10, 1));
        assert_eq!(split_addr(512 * 7 + 10, 512), (10, 7));
        assert_eq!(split_addr(2048, 1024), (0, 2));
    }

    #[test]
    fn split_addr_truncates_tag_to_16_bits() {
        let wrapped = 512u32 * 65536;
        assert_eq!(split_addr(wrapped, 512), (0, 0));
        let wrapped_plus_one = 512u32 * 65537;
        assert_eq!(split_addr(wrapped_plus_one, 512), (0, 1));
    }

    #[test]
    fn alignment_follows_the_bus_width() {
        assert!(is_aligned(0));
        assert!(is_aligned(256));
        assert!(is_aligned(0x0200_0000));
        assert!(!is_aligned(1));
        assert!(!is_aligned(255));
        assert!(!is_aligned(32), "payload-byte multiples are not enough");
    }

    #[test]
    fn channels_one_and_three_share_a_bank() {
        assert_eq!(bank_for_channel(1), bank_for_channel(3));
        let mut seen = [false; NUM_BANKS];
        for channel in 0..CHANNELS {
            seen[bank_for_channel(channel)] = true;
        }
        assert!(seen.iter().all(|&covered| covered));
    }

    #[test]
    fn dispatch_order_visits_each_channel_once_with_three_after_one() {
        let mut seen = [false; CHANNELS];
        for &channel in DISPATCH_ORDER.iter() {
            assert!(!seen[channel]);
            seen[channel] = true;
        }
        assert!(seen.iter().all(|&covered| covered));
        let pos = |wanted: usize| {
            DISPATCH_ORDER
                .iter()
                .position(|&channel| channel == wanted)
                .unwrap()
        };
        assert_eq!(pos(3), pos(1) + 1);
    }
}
