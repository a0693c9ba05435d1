//
// This file is part of the x86dis disassembler.
//
// Copyright 2025 the x86dis authors
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation
// files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy,
// modify, merge, publish, distribute, sublicense, and/or sell copies
// of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

extern crate clap;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process;

use clap::{App, Arg};

use x86dis::{Dialect, Disassembler, SECTION_CODE};

fn main() {
    env_logger::init();

    let matches = App::new("x86dis")
        .version("0.3")
        .about("x86/x86-64 flat binary disassembler")
        .arg(
            Arg::with_name("INPUT")
                .help("Flat binary file to disassemble")
                .required(true),
        )
        .arg(
            Arg::with_name("mode")
                .short("m")
                .long("mode")
                .value_name("BITS")
                .help("CPU mode: 16, 32 or 64")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("syntax")
                .short("s")
                .long("syntax")
                .value_name("DIALECT")
                .help("Output dialect: masm, nasm or gas")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("address")
                .short("a")
                .long("address")
                .value_name("HEX")
                .help("Load address of the first byte")
                .takes_value(true),
        )
        .get_matches();

    let word_size: u32 = match matches.value_of("mode").unwrap_or("64") {
        "16" => 16,
        "32" => 32,
        "64" => 64,
        other => {
            eprintln!("Invalid mode: {}", other);
            process::exit(2);
        }
    };

    let dialect = match matches.value_of("syntax").unwrap_or("nasm") {
        "masm" => Dialect::Masm,
        "nasm" => Dialect::Nasm,
        "gas" => Dialect::Gas,
        other => {
            eprintln!("Invalid syntax: {}", other);
            process::exit(2);
        }
    };

    let address = match u32::from_str_radix(
        matches
            .value_of("address")
            .unwrap_or("0")
            .trim_start_matches("0x"),
        16,
    ) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid address: {}", e);
            process::exit(2);
        }
    };

    let path = Path::new(matches.value_of("INPUT").unwrap());
    let mut buf = Vec::new();
    match File::open(path) {
        Ok(mut file) => {
            if let Err(e) = file.read_to_end(&mut buf) {
                eprintln!("Could not read {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Could not open {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    let size = buf.len() as u32;
    let mut dis = Disassembler::new(dialect);
    dis.init(2, i64::from(address));
    dis.add_section(&buf, size, size, address, SECTION_CODE, 4, word_size, "text");

    match dis.go() {
        Ok(()) => print!("{}", dis.output()),
        Err(e) => {
            eprintln!("Disassembly failed: {}", e);
            process::exit(1);
        }
    }
}
