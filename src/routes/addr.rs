// Address helpers: dotted-decimal parsing, netmask conversion, interface index lookup

use std::net::Ipv4Addr;

/// Index reported for an interface that could not be resolved
pub const IFINDEX_NOT_FOUND: u32 = u32::MAX;

/// Parse a dotted-decimal IPv4 address.
///
/// Invalid text yields `0.0.0.0` without any error, so callers must not treat
/// the result as validated input.
pub fn parse_dotted(text: &str) -> Ipv4Addr {
    text.parse().unwrap_or(Ipv4Addr::UNSPECIFIED)
}

/// Count the leading one-bits of a netmask.
///
/// The mask is shifted left until it becomes zero, so a non-contiguous mask
/// such as `255.0.255.0` yields the position of its last set bit (24) rather
/// than a canonical answer. Only contiguous masks have a defined result.
pub fn netmask_to_len(mask: Ipv4Addr) -> u8 {
    let mut hostmask = u32::from(mask);
    let mut len = 0;

    while hostmask != 0 {
        hostmask <<= 1;
        len += 1;
    }

    len
}

/// True for masks made of a run of one-bits followed only by zero-bits
pub fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

/// Resolves interface names to kernel interface indexes
pub trait InterfaceResolver {
    /// Returns the interface index, or [`IFINDEX_NOT_FOUND`]
    fn index_of(&self, name: &str) -> u32;
}

/// Resolver backed by the running kernel
pub struct SystemInterfaces;

impl InterfaceResolver for SystemInterfaces {
    fn index_of(&self, name: &str) -> u32 {
        interface_index(name)
    }
}

/// Kernel interface names are at most `IFNAMSIZ - 1` bytes with no NUL
fn fits_ifname(name: &str) -> bool {
    name.len() < libc::IFNAMSIZ && !name.contains('\0')
}

/// Look up an interface index with `SIOCGIFINDEX` on a transient packet socket.
///
/// The socket is owned by an `OwnedFd` and closed on every return path.
#[cfg(target_os = "linux")]
pub fn interface_index(name: &str) -> u32 {
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

    if !fits_ifname(name) {
        tracing::debug!("{:?} is not a valid interface name", name);
        return IFINDEX_NOT_FOUND;
    }

    // SAFETY: plain syscall with constant arguments; the result is checked below.
    let fd = unsafe { libc::socket(libc::PF_PACKET, libc::SOCK_RAW, 0) };
    if fd < 0 {
        tracing::debug!(
            "cannot open control socket for {}: {}",
            name,
            std::io::Error::last_os_error()
        );
        return IFINDEX_NOT_FOUND;
    }
    // SAFETY: `fd` is a freshly opened descriptor that nothing else owns.
    let sock = unsafe { OwnedFd::from_raw_fd(fd) };

    // SAFETY: `ifreq` is plain C data for which all-zero bytes are valid.
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    // The name fits with room left for the NUL terminator from the zeroing above
    for (dst, src) in ifr.ifr_name.iter_mut().zip(name.bytes()) {
        *dst = src as libc::c_char;
    }
    ifr.ifr_ifru.ifru_ifindex = -1;

    // SAFETY: `sock` is open for the whole call and `ifr` is a valid, NUL
    // terminated request that SIOCGIFINDEX only writes `ifru_ifindex` into.
    let rc = unsafe { libc::ioctl(sock.as_raw_fd(), libc::SIOCGIFINDEX as _, &mut ifr) };
    if rc < 0 {
        tracing::debug!(
            "SIOCGIFINDEX failed for {}: {}",
            name,
            std::io::Error::last_os_error()
        );
    }

    // A failed ioctl leaves the -1 sentinel in place, which reads back as IFINDEX_NOT_FOUND
    // SAFETY: `ifru_ifindex` was the last union field written, by us or the kernel.
    let index = unsafe { ifr.ifr_ifru.ifru_ifindex };
    index as u32
}

#[cfg(not(target_os = "linux"))]
pub fn interface_index(name: &str) -> u32 {
    if !fits_ifname(name) {
        return IFINDEX_NOT_FOUND;
    }
    let Ok(name) = std::ffi::CString::new(name) else {
        return IFINDEX_NOT_FOUND;
    };
    // SAFETY: `name` is a valid NUL terminated string that outlives the call.
    match unsafe { libc::if_nametoindex(name.as_ptr()) } {
        0 => IFINDEX_NOT_FOUND,
        index => index,
    }
}
