//! Runs the classic allocate / write / release sequence against the real host
//! and prints the address space after each step.

use vspace::{AddressSpace, Config, VirtAddr};

fn main() -> vspace::Result<()> {
    let mut space = AddressSpace::new(Config::default());

    // Ten arrays of 250 integers, 1000 bytes each.
    let mut arrays = Vec::new();
    for _ in 0..10 {
        arrays.push(space.allocate(250 * size_of::<i32>())?);
    }

    println!("------- Allocated virtual addresses -------");
    for addr in &arrays {
        println!("Virtual address: {addr}");
    }

    for (i, addr) in arrays.iter().enumerate() {
        let bytes = space.bytes_mut(*addr)?;
        for (n, chunk) in bytes.chunks_exact_mut(size_of::<i32>()).enumerate() {
            chunk.copy_from_slice(&((i * 1000 + n) as i32).to_ne_bytes());
        }
    }

    println!("\n------ Assigned value (array[0][1]) ------");
    let second = VirtAddr(arrays[0].0 + size_of::<i32>());
    let physical = space.translate(second)?;
    let mut raw = [0; size_of::<i32>()];
    raw.copy_from_slice(&space.bytes(second)?[..size_of::<i32>()]);
    let value = i32::from_ne_bytes(raw);
    println!("Virtual address: {second}\tPhysical address: {physical:p}\tValue: {value}");

    println!("\n--------- Printing stats [before release] ---------");
    print!("{}", space.report());

    println!("\n--------- Releasing array[3] ---------");
    space.release(arrays[3])?;
    print!("{}", space.report());

    println!("\n--------- Allocating 600 bytes into the hole ---------");
    let reused = space.allocate(600)?;
    println!("Virtual address: {reused}");
    print!("{}", space.report());

    println!("\n--------- Unmapping all memory ---------");
    let released = space.shutdown();
    println!("Released {released} pages");

    Ok(())
}
