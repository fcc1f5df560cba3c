//! Memory bus interface.

/// Memory bus interface.
///
/// The simulator reaches memory only through this trait, so any address
/// decoding (such as write protection of ROM) lives with the implementor.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&self, address: u16) -> u8;

    /// Write a byte to the given address.
    ///
    /// Implementations may silently discard the write.
    fn write(&mut self, address: u16, value: u8);

    /// Read a little-endian word. The high byte address wraps at 0xFFFF.
    fn read_word(&self, address: u16) -> u16 {
        u16::from(self.read(address)) | u16::from(self.read(address.wrapping_add(1))) << 8
    }

    /// Write a little-endian word. The high byte address wraps at 0xFFFF.
    fn write_word(&mut self, address: u16, value: u16) {
        self.write(address, value as u8);
        self.write(address.wrapping_add(1), (value >> 8) as u8);
    }
}
