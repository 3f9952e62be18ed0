use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, LevelFilter};

use synvm::address::MEMORY_SIZE;
use synvm::bytecode::{decode_image, encode_image, parse_assembly, Instruction};
use synvm::io::LineInput;
use synvm::loader::load_file;
use synvm::{VmError, VM};

/// A virtual machine for a 16-bit word instruction set
#[derive(Parser)]
#[command(version)]
struct Args {
  /// Diagnostic log level. `RUST_LOG` takes precedence when set.
  #[arg(long, global = true, default_value = "warn")]
  log_level: LevelFilter,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load an image and execute it
  Run {
    /// Binary image to execute
    image: PathBuf,
    /// Print the machine state when it halts
    #[arg(long)]
    dump: bool,
    /// Memory window shown by --dump, as START..END
    #[arg(long, default_value = "0..16", value_parser = parse_range)]
    dump_range: (usize, usize),
  },
  /// Print the instructions in an image
  Disassemble {
    image: PathBuf,
    /// First address to decode
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// Number of instructions to print
    #[arg(long)]
    count: Option<usize>,
  },
  /// Assemble a source file into an image
  Assemble {
    source: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
  },
}

fn parse_range(text: &str) -> Result<(usize, usize), String> {
  let (start, end) = text.split_once("..").ok_or("expected START..END")?;
  let start = start.parse::<usize>().map_err(|e| e.to_string())?;
  let end   = end.parse::<usize>().map_err(|e| e.to_string())?;
  Ok((start, end))
}

fn run(image: PathBuf, dump: bool, dump_range: (usize, usize)) -> Result<(), VmError> {
  let stdin  = io::stdin();
  let input  = LineInput::new(stdin.lock());
  let mut vm = VM::new(input, io::stdout());

  load_file(vm.space_mut(), &image)?;
  let result = vm.run();

  if dump {
    eprintln!("{}", vm.snapshot(dump_range.0..dump_range.1));
  }
  result.map(|_| ())
}

fn disassemble(image: PathBuf, start: usize, count: Option<usize>) -> Result<(), VmError> {
  let words   = decode_image(&fs::read(image)?);
  let mut out = BufWriter::new(io::stdout().lock());
  let mut ip  = start;
  let mut printed = 0;

  while ip < words.len().min(MEMORY_SIZE) && count.map_or(true, |n| printed < n) {
    let instruction = Instruction::decode(&words, ip);
    writeln!(out, "{:>5}: {}", ip, instruction)?;
    ip += instruction.size() as usize;
    printed += 1;
  }
  out.flush()?;
  Ok(())
}

fn assemble(source: PathBuf, output: PathBuf) -> Result<(), VmError> {
  let text  = fs::read_to_string(source)?;
  let words = parse_assembly(&text)?;
  if words.len() > MEMORY_SIZE {
    return Err(VmError::ImageTooLarge { words: words.len() });
  }
  fs::write(output, encode_image(&words))?;
  Ok(())
}

fn main() -> ExitCode {
  let args = Args::parse();

  env_logger::Builder::new()
    .filter_level(args.log_level)
    .parse_default_env()
    .init();

  let result = match args.command {
    Command::Run { image, dump, dump_range } => run(image, dump, dump_range),
    Command::Disassemble { image, start, count } => disassemble(image, start, count),
    Command::Assemble { source, output } => assemble(source, output),
  };

  match result {
    Ok(())  => ExitCode::SUCCESS,
    Err(e)  => {
      error!("{}", e);
      ExitCode::FAILURE
    }
  }
}
