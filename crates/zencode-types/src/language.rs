//! Supported editor languages.
//!
//! Each language carries the starter code shown when no snapshot exists, the
//! identifier the editor widget uses for highlighting, and the icon asset path.
//! The icon path follows the `"/" + id + ".png"` asset convention.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

/// A language the editor can be switched to.
#[derive(
    Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Javascript,
    Typescript,
    Python,
    Java,
    Go,
    Rust,
    Cpp,
    Csharp,
    Ruby,
    Swift,
}

/// Returned when parsing a language id that is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::iter()
            .find(|lang| lang.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLanguage(wanted.to_string()))
    }
}

impl Language {
    /// All supported languages, in menu order.
    pub fn all() -> Vec<Language> {
        Language::iter().collect()
    }

    /// Stable lowercase identifier, used in storage keys and asset paths.
    pub fn id(&self) -> &str {
        self.as_ref()
    }

    /// Human-facing name.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Javascript => "JavaScript",
            Language::Typescript => "TypeScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::Cpp => "C++",
            Language::Csharp => "C#",
            Language::Ruby => "Ruby",
            Language::Swift => "Swift",
        }
    }

    /// Identifier the editor widget uses for syntax highlighting.
    pub fn editor_language(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Cpp => "cpp",
            Language::Csharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
        }
    }

    /// Icon asset path.
    pub fn icon_path(&self) -> String {
        format!("/{}.png", self.id())
    }

    /// Starter code shown when the user has no snapshot for this language.
    pub fn default_code(&self) -> &'static str {
        match self {
            Language::Javascript => JAVASCRIPT_STARTER,
            Language::Typescript => TYPESCRIPT_STARTER,
            Language::Python => PYTHON_STARTER,
            Language::Java => JAVA_STARTER,
            Language::Go => GO_STARTER,
            Language::Rust => RUST_STARTER,
            Language::Cpp => CPP_STARTER,
            Language::Csharp => CSHARP_STARTER,
            Language::Ruby => RUBY_STARTER,
            Language::Swift => SWIFT_STARTER,
        }
    }
}

const JAVASCRIPT_STARTER: &str = r#"// JavaScript Playground
const numbers = [1, 2, 3, 4, 5];

const squares = numbers.map((n) => n * n);
console.log("Squares:", squares);

const evens = numbers.filter((n) => n % 2 === 0);
console.log("Evens:", evens);

const sum = numbers.reduce((acc, n) => acc + n, 0);
console.log("Sum:", sum);
"#;

const TYPESCRIPT_STARTER: &str = r#"// TypeScript Playground
interface Point {
  x: number;
  y: number;
}

const points: Point[] = [
  { x: 1, y: 2 },
  { x: 3, y: 4 },
];

const distance = (p: Point): number => Math.sqrt(p.x * p.x + p.y * p.y);
points.forEach((p) => console.log(`(${p.x}, ${p.y}) -> ${distance(p)}`));
"#;

const PYTHON_STARTER: &str = r#"# Python Playground
numbers = [1, 2, 3, 4, 5]

squares = [n * n for n in numbers]
print(f"Squares: {squares}")

evens = [n for n in numbers if n % 2 == 0]
print(f"Evens: {evens}")

print(f"Sum: {sum(numbers)}")
"#;

const JAVA_STARTER: &str = r#"import java.util.Arrays;

public class Main {
    public static void main(String[] args) {
        int[] numbers = {1, 2, 3, 4, 5};

        int[] squares = Arrays.stream(numbers).map(n -> n * n).toArray();
        System.out.println("Squares: " + Arrays.toString(squares));

        int sum = Arrays.stream(numbers).sum();
        System.out.println("Sum: " + sum);
    }
}
"#;

const GO_STARTER: &str = r#"package main

import "fmt"

func main() {
	numbers := []int{1, 2, 3, 4, 5}

	sum := 0
	for _, n := range numbers {
		fmt.Printf("%d squared is %d\n", n, n*n)
		sum += n
	}
	fmt.Println("Sum:", sum)
}
"#;

const RUST_STARTER: &str = r#"fn main() {
    let numbers = vec![1, 2, 3, 4, 5];

    let squares: Vec<i32> = numbers.iter().map(|n| n * n).collect();
    println!("Squares: {:?}", squares);

    let sum: i32 = numbers.iter().sum();
    println!("Sum: {}", sum);
}
"#;

const CPP_STARTER: &str = r#"#include <iostream>
#include <numeric>
#include <vector>

int main() {
    std::vector<int> numbers = {1, 2, 3, 4, 5};

    for (int n : numbers) {
        std::cout << n << " squared is " << n * n << std::endl;
    }

    int sum = std::accumulate(numbers.begin(), numbers.end(), 0);
    std::cout << "Sum: " << sum << std::endl;
    return 0;
}
"#;

const CSHARP_STARTER: &str = r#"using System;
using System.Linq;

class Program {
    static void Main() {
        var numbers = new[] { 1, 2, 3, 4, 5 };

        var squares = numbers.Select(n => n * n);
        Console.WriteLine($"Squares: {string.Join(", ", squares)}");

        Console.WriteLine($"Sum: {numbers.Sum()}");
    }
}
"#;

const RUBY_STARTER: &str = r#"# Ruby Playground
numbers = [1, 2, 3, 4, 5]

squares = numbers.map { |n| n * n }
puts "Squares: #{squares.inspect}"

evens = numbers.select(&:even?)
puts "Evens: #{evens.inspect}"

puts "Sum: #{numbers.sum}"
"#;

const SWIFT_STARTER: &str = r#"// Swift Playground
let numbers = [1, 2, 3, 4, 5]

let squares = numbers.map { $0 * $0 }
print("Squares: \(squares)")

let sum = numbers.reduce(0, +)
print("Sum: \(sum)")
"#;

// ============================================================================
// Tests
// ============================================================================
