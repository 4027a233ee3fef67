// Dispatch binary
//
// Hand-rolled single-letter flag grammar, consumed strictly in order:
//
//   circle-lottery [N<agents>] [B] [A] [C] [D] [E] [F] [P] [S|V<level>]
//                  [R] [I] [J<bound>] [G] <graph-size> <method> [params..]
//                  [M<a> <method> ..] [R<t>] [F<filter>..] [P<type>]
//                  [E<exit-code>] [L<limit>]
//
// Configuration errors exit with code 1, table shape mismatches with the
// cause-distinguishing codes 2 (dimension) and 3 (agent count), and a
// pre-flight size-limit hit with the caller-selected code.

use std::env;
use std::process::exit;

use simple_logger::SimpleLogger;

use cl_rust::{
    check, circle_rank, distance_based_lottery, gap_based_lottery, mixed_lottery, opt_lottery,
    opposition_based_lottery, power_rank, randomized_lottery, randomized_lottery2, rd_ratio,
    reversed_lottery, score, table_lottery, uniform_dictatorship, uniform_rank, ApproxRatio,
    AsymmetricSeqs, BalanceFilter, BoundedDistinctSeqs, Circle, DominanceFilter, IncreasingSeqs,
    Lottery, LotteryTable, PcdBound, SeqGenerator, StreamSeqs, SumQ, TableError, Verbosity,
};

fn fail(reason: &str) -> ! {
    println!("{}", reason);
    exit(1);
}

/// Positional/flag argument stream.
struct ArgStream {
    args: Vec<String>,
    pos: usize,
}

impl ArgStream {
    fn new() -> Self {
        Self {
            args: env::args().skip(1).collect(),
            pos: 0,
        }
    }

    /// Take the next argument or die with a configuration error.
    fn consume(&mut self, what: &str) -> String {
        if self.pos >= self.args.len() {
            fail(&format!("expected parameter: {}", what));
        }
        self.pos += 1;
        self.args[self.pos - 1].clone()
    }

    /// Take the next argument if it starts with `symbol`, returning the rest.
    fn flag(&mut self, symbol: char) -> Option<String> {
        match self.args.get(self.pos) {
            Some(arg) if arg.starts_with(symbol) => {
                self.pos += 1;
                Some(arg[symbol.len_utf8()..].to_string())
            }
            _ => None,
        }
    }

    fn flag_or(&mut self, symbol: char, default: &str) -> String {
        self.flag(symbol).unwrap_or_else(|| default.to_string())
    }

    fn exhausted(&self) -> bool {
        self.pos >= self.args.len()
    }
}

fn parse_usize(val: &str, what: &str) -> usize {
    val.parse()
        .unwrap_or_else(|_| fail(&format!("invalid {}: {}", what, val)))
}

fn parse_f64(val: &str, what: &str) -> f64 {
    val.parse()
        .unwrap_or_else(|_| fail(&format!("invalid {}: {}", what, val)))
}

fn parse_lottery(args: &mut ArgStream, graph_size: usize, agents_num: usize) -> Lottery {
    let method = args.consume("method");
    match method.as_str() {
        "rd" => uniform_dictatorship(),
        "pcd" => distance_based_lottery(graph_size, uniform_rank),
        "pcd2" => opposition_based_lottery(graph_size, |r| r, false),
        "pcd3" => {
            let mut weights = vec![0.0; agents_num];
            weights[(agents_num - 1) / 2] = 1.0;
            gap_based_lottery(graph_size, weights, true)
        }
        "r3pcd" => {
            let n = agents_num as f64;
            let weights: Vec<f64> = (0..agents_num)
                .map(|i| {
                    let i = i as f64;
                    (1.0 + 2.0 * i) * n - 2.0 / 3.0 - 2.0 * i * (i + 1.0)
                })
                .collect();
            gap_based_lottery(graph_size, weights, true)
        }
        "dbl" => {
            let e = parse_f64(&args.consume("exponent"), "exponent");
            distance_based_lottery(graph_size, power_rank(e))
        }
        "sqcd" => distance_based_lottery(graph_size, circle_rank),
        "qcd" => {
            let bound = parse_f64(&args.consume("exponent"), "exponent");
            opposition_based_lottery(graph_size, move |r| (r * r).max(bound * bound), true)
        }
        "custom0" => load_table_lottery(&args.consume("path"), graph_size, agents_num, 0),
        "custom1" => load_table_lottery(&args.consume("path"), graph_size, agents_num, 1),
        "opt" => opt_lottery(Circle::new(graph_size)),
        _ => fail(&format!("unrecognised method: {}", method)),
    }
}

fn load_table_lottery(path: &str, graph_size: usize, agents_num: usize, mode: usize) -> Lottery {
    let table = match LotteryTable::load(path) {
        Ok(table) => table,
        Err(e) => fail(&e.to_string()),
    };
    match table_lottery(graph_size, agents_num, table, mode) {
        Ok(lot) => lot,
        Err(TableError::DimensionMismatch) => exit(2),
        Err(TableError::AgentCountMismatch) => exit(3),
        Err(e) => fail(&e.to_string()),
    }
}

fn main() {
    SimpleLogger::new().init().unwrap();

    let mut args = ArgStream::new();
    let agents_num = parse_usize(&args.flag_or('N', "3"), "num of agents");
    let rd_flag = args.flag('B').is_some();
    let sc_flag = args.flag('A').is_some();
    let complexity_flag = args.flag('C').is_some();
    let _ = args.flag('D'); // check mode is the default
    let avg_flag = args.flag('E').is_some();
    let pcd_bound_flag = args.flag('F').is_some();
    let num_of_points_flag = args.flag('P').is_some();
    let mut verbosity = if args.flag('S').is_some() {
        Verbosity::Summary
    } else {
        Verbosity::All
    };
    if let Some(val) = args.flag('V') {
        verbosity = match parse_usize(&val, "verbosity") {
            0 => Verbosity::None,
            1 => Verbosity::Answer,
            2 => Verbosity::Summary,
            3 => Verbosity::All,
            _ => fail(&format!("unrecognised verbosity: {}", val)),
        };
    }
    let reversed_lot = args.flag('R').is_some();
    let reverse_optimization = args.flag('I').is_some();
    let boring_optimization = parse_usize(&args.flag_or('J', "0"), "distinct-value bound");
    let stdin_generator = args.flag('G').is_some();
    let graph_size = parse_usize(&args.consume("size of graph"), "size of graph");
    let graph = Circle::new(graph_size);

    let mut lot = parse_lottery(&mut args, graph_size, agents_num);

    while let Some(val) = args.flag('M') {
        let a = parse_f64(&val, "mix coefficient");
        lot = mixed_lottery(a, parse_lottery(&mut args, graph_size, agents_num), lot);
    }

    while let Some(val) = args.flag('R') {
        match parse_usize(&val, "randomization type") {
            0 => lot = randomized_lottery(lot),
            1 => lot = randomized_lottery2(lot),
            _ => fail(&format!("unrecognised randomization type: {}", val)),
        }
    }

    if reversed_lot {
        lot = reversed_lottery(graph_size, lot);
    }

    let mut generator: Box<dyn SeqGenerator> = if stdin_generator {
        Box::new(StreamSeqs::new(std::io::stdin().lock()))
    } else if boring_optimization > 0 {
        Box::new(BoundedDistinctSeqs::new(
            0,
            graph_size,
            agents_num,
            boring_optimization,
            true,
        ))
    } else if reverse_optimization {
        Box::new(AsymmetricSeqs::new(0, graph_size, agents_num))
    } else {
        Box::new(IncreasingSeqs::new(0, graph_size, agents_num))
    };

    while let Some(val) = args.flag('F') {
        generator = match val.chars().next() {
            Some('1') => Box::new(BalanceFilter::new(generator, graph_size)),
            Some('2') => Box::new(DominanceFilter::new(generator)),
            _ => fail(&format!("unrecognised filter: {}", val)),
        };
    }

    if let Some(val) = args.flag('P') {
        // Strategyproofisation: mix toward random dictatorship with the
        // lottery's own rd-ratio as the coefficient
        let gen_type = if val.is_empty() {
            0
        } else {
            parse_usize(&val, "strategyproofisation type")
        };
        let mut gen: Box<dyn SeqGenerator> = match gen_type {
            1 => Box::new(BoundedDistinctSeqs::new(
                0,
                graph_size,
                agents_num,
                boring_optimization,
                true,
            )),
            0 => Box::new(AsymmetricSeqs::new(0, graph_size, agents_num)),
            _ => Box::new(IncreasingSeqs::new(0, graph_size, agents_num)),
        };
        let ratio = rd_ratio(&lot, gen.as_mut(), &Circle::new(graph_size), Verbosity::None);
        lot = mixed_lottery(ratio, uniform_dictatorship(), lot);
    }

    let exit_code_on_limit: i32 = args
        .flag_or('E', "0")
        .parse()
        .unwrap_or_else(|_| fail("invalid exit code on limit"));

    if let Some(val) = args.flag('L') {
        let limit = parse_f64(&val, "limit");
        let estimated_size = generator.approx_size();
        if limit > 0.0 && estimated_size > limit {
            if verbosity == Verbosity::Answer {
                print!("SEQS: {:.2e}", estimated_size);
            } else if verbosity >= Verbosity::Summary {
                println!("Estimated number of sequences: {:.2e}", estimated_size);
            }
            exit(exit_code_on_limit);
        }
    }

    if !args.exhausted() {
        fail("unconsumed arguments left");
    }

    if rd_flag {
        rd_ratio(&lot, generator.as_mut(), &graph, verbosity);
    } else if pcd_bound_flag {
        let quantity = SumQ::new(Box::new(PcdBound), Box::new(ApproxRatio::new(&lot)));
        score(&quantity, generator.as_mut(), &graph, verbosity, avg_flag, false);
    } else if sc_flag || avg_flag || num_of_points_flag {
        let quantity = ApproxRatio::new(&lot);
        score(
            &quantity,
            generator.as_mut(),
            &graph,
            verbosity,
            avg_flag,
            num_of_points_flag,
        );
    } else if complexity_flag && verbosity >= Verbosity::Answer {
        print!("{:.2e}", generator.approx_size());
        if verbosity >= Verbosity::Summary {
            println!();
        }
    } else {
        check(&lot, generator.as_mut(), &graph, verbosity);
    }
}
