//! Kill and pickup rewards.

use bytes::BufMut;

use crate::codec::ProtoEncode;
use crate::types::ItemReward;

/// Server → Client. Updated currency totals plus any items granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepRewardItem {
    pub money: i32,
    pub fusion_matter: i32,
    pub battery_n: i32,
    pub battery_w: i32,
    pub fatigue: i8,
    pub fatigue_level: i8,
    pub items: Vec<ItemReward>,
}

impl RepRewardItem {
    pub const BASE_SIZE: usize = 22;
}

impl ProtoEncode for RepRewardItem {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_le(self.money);
        buf.put_i32_le(self.fusion_matter);
        buf.put_i32_le(self.battery_n);
        buf.put_i32_le(self.battery_w);
        buf.put_i8(self.fatigue);
        buf.put_i8(self.fatigue_level);
        buf.put_i32_le(self.items.len() as i32);
        for item in &self.items {
            item.proto_encode(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_to_vec, FixedSize};

    #[test]
    fn reward_without_items_is_header_only() {
        let pkt = RepRewardItem {
            money: 10,
            fusion_matter: 20,
            battery_n: 0,
            battery_w: 0,
            fatigue: 100,
            fatigue_level: 1,
            items: Vec::new(),
        };
        assert_eq!(encode_to_vec(&pkt).len(), RepRewardItem::BASE_SIZE);
    }

    #[test]
    fn reward_with_item() {
        let pkt = RepRewardItem {
            money: 10,
            fusion_matter: 20,
            battery_n: 0,
            battery_w: 0,
            fatigue: 100,
            fatigue_level: 1,
            items: vec![ItemReward::default()],
        };
        assert_eq!(
            encode_to_vec(&pkt).len(),
            RepRewardItem::BASE_SIZE + ItemReward::SIZE
        );
    }
}
