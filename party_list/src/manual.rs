/*!

This is the long-form manual for `party_list` and `plvote`.

## Input format

Ballots are stored in plain text files, one record per line. A file starts
with a header of four lines:

1. the election type: `OPL` for an open party list, anything else (usually `CPL`) for a closed party list
2. the number of seats
3. the number of ballots in this file
4. the number of structure lines that follow (parties for CPL, candidates for OPL)

### `CPL`

Each structure line declares a party followed by its candidates, in list
order. The order matters: the seats of the party go to the first candidates
of the list.

```text
CPL
3
9
6
Democratic, Joe, Sally, Ahmed
Republican, Allen, Nikki, Taihui
New Wave, Sarah
Reform, Xinyue, Nikita
Green, Bethany
Independent, Mike
1,,,,,
,1,,,,
...
```

### `OPL`

Each structure line declares one candidate and their party. Parties are
listed in the order in which they first appear.

```text
OPL
2
9
6
Democrat, Pike
Democrat, Lucy
Democrat, Beiye
Republican, Etta
Republican, Alawa
Independent1, Sasha
1,,,,,
,,,,1,
...
```

### Ballots

A ballot has one flag per party (CPL) or per candidate (OPL), separated by
commas. Exactly one flag must be `1`, the others are empty or `0`. A ballot
with no mark or with several marks is rejected as spoiled and the whole run
stops.

Parties whose name contains `Independent` are flagged as independent.

### Several files

An election can be split across several files. Every file carries the same
header and structure lines, and its own ballots. The structure is read from
the first file only. The type, the number of seats and the number of
structure lines of the later files must match the first one.

## Allocation

Seats are first distributed with the quota `ceil(ballots / seats)`: a party
receives one seat per full quota of votes, never more seats than it has
candidates. The leftover seats are handed out in full rounds while every
party still able to receive a seat can get one, then by decreasing
remainder. When parties tie on the last seats, a lottery decides.

In an open list, the seats of a party go to its candidates with the most
votes, with the same lottery for ties.

## Configuration

`plvote` runs with sensible defaults. A configuration file in JSON can name
the ballot files and control the output and the lottery:

```json
{
  "outputSettings": {
    "contestName": "City council",
    "outputDirectory": "output",
    "contestDate": "2024-11-05"
  },
  "ballotFileSources": [
    { "filePath": "precinct_1.csv" },
    { "filePath": "precinct_2.csv" }
  ],
  "rules": {
    "tiebreakMode": "seeded",
    "randomSeed": "42"
  }
}
```

- `ballotFileSources[].filePath` is relative to the configuration file.
- `rules.tiebreakMode` is `random` (default) or `seeded`. With `seeded`,
  `randomSeed` is mandatory and the same seed always produces the same
  outcome.
- the `--input`, `--out` and `--seed` flags take precedence over the file.

*/
