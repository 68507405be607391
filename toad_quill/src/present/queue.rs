/// Queue family selection

use crate::present::{QueueFamily, QueueFlags};

/// Find the queue family that best matches `desired`
///
/// Families missing every desired bit are skipped, as are families that
/// cannot present when `supports_present` is given. A family with no bits
/// beyond `desired` is returned immediately. Otherwise the family whose
/// extra-bit mask is numerically smallest wins, the earliest one on ties.
///
/// # Example
///
/// ```
/// use toad_quill::quill::present::{find_queue_family, QueueFamily, QueueFlags};
///
/// let families = [
///     QueueFamily { flags: QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER, queue_count: 16 },
///     QueueFamily { flags: QueueFlags::TRANSFER, queue_count: 2 },
/// ];
/// assert_eq!(find_queue_family(&families, QueueFlags::TRANSFER, None::<fn(u32) -> bool>), Some(1));
/// ```
pub fn find_queue_family<F>(
    families: &[QueueFamily],
    desired: QueueFlags,
    supports_present: Option<F>,
) -> Option<u32>
where
    F: Fn(u32) -> bool,
{
    let mut best: Option<(u32, u32)> = None;

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if !family.flags.intersects(desired) {
            continue;
        }

        if let Some(supports) = &supports_present {
            if !supports(index) {
                continue;
            }
        }

        let extra = (family.flags & !desired).bits();
        if extra == 0 {
            return Some(index);
        }

        match best {
            Some((_, best_extra)) if best_extra <= extra => {}
            _ => best = Some((index, extra)),
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
