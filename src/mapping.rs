use crate::region::RegionInfo;
use crate::types::PageRole;

pub fn global_video_key(role: PageRole) -> String {
    format!("{}_vsl", role.key_prefix())
}

pub fn regional_video_key(role: PageRole, region: &RegionInfo) -> String {
    format!("{}{}", global_video_key(role), region.key_suffix)
}

pub fn global_banner_key(role: PageRole) -> String {
    format!("{}_banner", role.key_prefix())
}

pub fn regional_banner_key(role: PageRole, region: &RegionInfo) -> String {
    format!("{}{}", global_banner_key(role), region.key_suffix)
}
