use std::{io::Read, mem};

use ralign::{AlignedBlock, HEADER_SIZE, aligned_free, aligned_malloc, align::is_aligned, print_block};

/// Waits until the user presses ENTER.
/// Handy for inspecting the process with `pmap` or `gdb` between steps.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  println!(
    "pointer size = {}, header size = {}",
    mem::size_of::<*mut u8>(),
    HEADER_SIZE
  );

  unsafe {
    // --------------------------------------------------------------------
    // 1) A cache-line sized block aligned to 16.
    // --------------------------------------------------------------------
    let first = aligned_malloc(64, 16);
    println!("\n[1] aligned_malloc(64, 16)");
    print_block(64, 16, first);

    let first_ptr = first as *mut u64;
    first_ptr.write(0xDEADBEEF);
    println!("[1] Value written = 0x{:X}", first_ptr.read());

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Alignment below the pointer size still reserves a full header.
    // --------------------------------------------------------------------
    let second = aligned_malloc(12, 2);
    println!("\n[2] aligned_malloc(12, 2)");
    print_block(12, 2, second);

    second.write_bytes(0xAB, 12);
    println!("[2] Initialized second block with 0xAB");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) A page-aligned block. The slack grows with the alignment.
    // --------------------------------------------------------------------
    let third = aligned_malloc(100, 4096);
    println!("\n[3] aligned_malloc(100, 4096)");
    print_block(100, 4096, third);
    println!("[3] page aligned? {}", is_aligned(third as usize, 4096));

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) 1 MiB, large enough for malloc to switch to mmap.
    // --------------------------------------------------------------------
    let fourth = aligned_malloc(1024 * 1024, 64);
    println!("\n[4] aligned_malloc(1 MiB, 64)");
    print_block(1024 * 1024, 64, fourth);

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Release everything, null included.
    // --------------------------------------------------------------------
    for handle in [first, second, third, fourth, std::ptr::null_mut()] {
      aligned_free(handle);
    }
    println!("\n[5] Released all blocks");
  }

  // ----------------------------------------------------------------------
  // 6) The safe wrapper frees on drop.
  // ----------------------------------------------------------------------
  match AlignedBlock::allocate(256, 64) {
    Ok(mut block) => {
      block.as_mut_slice().fill(1);
      println!("\n[6] {block:?}, sum = {}", block.as_slice().iter().map(|&b| b as u32).sum::<u32>());
    }
    Err(err) => println!("\n[6] {err}"),
  }

  println!("\n[7] End of example.");
}
